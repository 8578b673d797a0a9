//! Input routes — `POST /mouse_events` and `POST /key_events`.
//!
//! Bodies are read as raw bytes and parsed as JSON whatever the request's
//! `Content-Type`. Accepted events answer `200` with an empty body.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use crate::services::input::{self, ErrorCode, InputError, KeyOutcome};
use crate::state::AppState;

pub(crate) fn input_error_to_status(err: &InputError) -> StatusCode {
    match err {
        InputError::BadJson(_) | InputError::NotAnObject | InputError::MissingField(_) | InputError::InvalidEvent(_) => {
            StatusCode::BAD_REQUEST
        }
        InputError::World(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn reject(endpoint: &'static str, err: &InputError) -> StatusCode {
    warn!(endpoint, code = err.error_code(), error = %err, "input rejected");
    input_error_to_status(err)
}

pub async fn handle_mouse_event(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let result = input::parse_mouse_event(&body).and_then(|event| input::apply_mouse_event(&state.world, event));
    match result {
        Ok(_) => StatusCode::OK,
        Err(e) => reject("mouse_events", &e),
    }
}

pub async fn handle_key_event(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match input::parse_key_event(&body) {
        Ok(event) => {
            if input::apply_key_event(&state.world, &event) == KeyOutcome::Reset {
                info!("world reset");
            }
            StatusCode::OK
        }
        Err(e) => reject("key_events", &e),
    }
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;
