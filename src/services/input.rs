//! Input service — translate viewer mouse and key events into world mutations.
//!
//! DESIGN
//! ======
//! Bodies are parsed as JSON whatever the request's content type. A mouse
//! event must carry `x`, `y` and `click` (which may be `null`). Each event
//! performs exactly one `WorldStore` operation:
//!
//! | `click` | effect |
//! |---------|--------|
//! | `true`  | start a drawing gesture |
//! | `false` | end the drawing gesture |
//! | `null`  | draw at the point while drawing, otherwise set the goal there |
//!
//! Only the `r` key does anything (reset); every other key is accepted and
//! ignored. A rejected event never changes the world.

use serde::Deserialize;
use serde_json::Value;

use crate::world::{DisplayPoint, PointerOutcome, WorldError, WorldStore};

pub const RESET_KEY: &str = "r";

/// Stable machine-readable code for an error, used in logs.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("malformed JSON: {0}")]
    BadJson(serde_json::Error),
    #[error("event must be a JSON object")]
    NotAnObject,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid event: {0}")]
    InvalidEvent(serde_json::Error),
    #[error(transparent)]
    World(#[from] WorldError),
}

impl ErrorCode for InputError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadJson(_) => "E_BAD_JSON",
            Self::NotAnObject => "E_NOT_OBJECT",
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::InvalidEvent(_) => "E_INVALID_EVENT",
            Self::World(WorldError::NonFinite { .. }) => "E_COORD_NON_FINITE",
            Self::World(WorldError::OutOfBounds { .. }) => "E_COORD_RANGE",
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MouseEvent {
    pub x: f64,
    pub y: f64,
    pub click: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyEvent {
    pub key: String,
}

/// Parse a `/mouse_events` body.
///
/// # Errors
///
/// Returns [`InputError`] for invalid JSON, a non-object body, a missing
/// `x`/`y`/`click`, or a field of the wrong type.
pub fn parse_mouse_event(body: &[u8]) -> Result<MouseEvent, InputError> {
    parse_event(body, &["x", "y", "click"])
}

/// Parse a `/key_events` body.
///
/// # Errors
///
/// Returns [`InputError`] for invalid JSON, a non-object body, or a missing
/// or non-string `key`.
pub fn parse_key_event(body: &[u8]) -> Result<KeyEvent, InputError> {
    parse_event(body, &["key"])
}

fn parse_event<T>(body: &[u8], required: &[&'static str]) -> Result<T, InputError>
where
    T: serde::de::DeserializeOwned,
{
    let value: Value = serde_json::from_slice(body).map_err(InputError::BadJson)?;
    let Some(fields) = value.as_object() else {
        return Err(InputError::NotAnObject);
    };
    if let Some(missing) = required.iter().find(|f| !fields.contains_key(**f)) {
        return Err(InputError::MissingField(*missing));
    }
    serde_json::from_value(value).map_err(InputError::InvalidEvent)
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseOutcome {
    DrawingStarted,
    DrawingStopped,
    Pointer(PointerOutcome),
}

/// Apply one mouse event to the world.
///
/// # Errors
///
/// Returns [`InputError::World`] when a pointer event lands off the canvas
/// or carries non-finite coordinates.
pub fn apply_mouse_event(world: &WorldStore, event: MouseEvent) -> Result<MouseOutcome, InputError> {
    match event.click {
        Some(true) => {
            world.set_drawing(true);
            Ok(MouseOutcome::DrawingStarted)
        }
        Some(false) => {
            world.set_drawing(false);
            Ok(MouseOutcome::DrawingStopped)
        }
        None => Ok(MouseOutcome::Pointer(world.pointer(DisplayPoint::new(event.x, event.y))?)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Reset,
    Ignored,
}

/// Apply one key event to the world.
pub fn apply_key_event(world: &WorldStore, event: &KeyEvent) -> KeyOutcome {
    if event.key == RESET_KEY {
        world.reset();
        KeyOutcome::Reset
    } else {
        KeyOutcome::Ignored
    }
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;
