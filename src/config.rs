//! Server configuration parsed from environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scene::{FootprintStyle, UnknownFootprintStyle};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SIM_TICK_MS: u64 = 10;
pub const DEFAULT_FRAME_BUFFER: usize = 4;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read planner config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse planner config {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
    #[error("invalid planner config: {0}")]
    Planner(#[from] dwa::ConfigError),
    #[error(transparent)]
    FootprintStyle(#[from] UnknownFootprintStyle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Simulation/render period.
    pub tick: Duration,
    /// Parts a slow viewer may fall behind before the oldest are dropped.
    pub frame_buffer: usize,
    pub jpeg_quality: u8,
    pub footprint_style: FootprintStyle,
    pub planner: dwa::Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick: Duration::from_millis(DEFAULT_SIM_TICK_MS),
            frame_buffer: DEFAULT_FRAME_BUFFER,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            footprint_style: FootprintStyle::default(),
            planner: dwa::Config::default(),
        }
    }
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 5000
    /// - `SIM_TICK_MS`: default 10 (minimum 1)
    /// - `FRAME_BUFFER`: default 4
    /// - `JPEG_QUALITY`: default 95, clamped to 1..=100
    /// - `FOOTPRINT_STYLE`: `approximate` (default) or `oriented`
    /// - `PLANNER_CONFIG`: YAML file overriding planner fields
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown footprint style or an
    /// unreadable, malformed, or invalid planner file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let footprint_style = match std::env::var("FOOTPRINT_STYLE") {
            Ok(raw) => raw.parse()?,
            Err(_) => FootprintStyle::default(),
        };
        let planner = match std::env::var("PLANNER_CONFIG") {
            Ok(path) => load_planner_config(Path::new(&path))?,
            Err(_) => dwa::Config::default(),
        };

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            tick: Duration::from_millis(env_parse("SIM_TICK_MS", DEFAULT_SIM_TICK_MS).max(1)),
            frame_buffer: env_parse("FRAME_BUFFER", DEFAULT_FRAME_BUFFER).max(1),
            jpeg_quality: env_parse("JPEG_QUALITY", DEFAULT_JPEG_QUALITY).clamp(1, 100),
            footprint_style,
            planner,
        })
    }
}

/// Load a planner config from YAML. Fields absent from the file keep their
/// defaults; angles are radians.
///
/// # Errors
///
/// Returns [`ConfigError::Read`], [`ConfigError::Parse`], or
/// [`ConfigError::Planner`] when validation fails.
pub fn load_planner_config(path: &Path) -> Result<dwa::Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let config = parse_planner_config(&raw).map_err(|err| match err {
        ParseFailure::Yaml(source) => ConfigError::Parse { path: path.to_path_buf(), source },
        ParseFailure::Invalid(err) => ConfigError::Planner(err),
    })?;
    Ok(config)
}

enum ParseFailure {
    Yaml(serde_yaml::Error),
    Invalid(dwa::ConfigError),
}

fn parse_planner_config(raw: &str) -> Result<dwa::Config, ParseFailure> {
    // An empty document deserializes as unit, not as an empty mapping.
    if raw.trim().is_empty() {
        return Ok(dwa::Config::default());
    }
    let config: dwa::Config = serde_yaml::from_str(raw).map_err(ParseFailure::Yaml)?;
    config.validate().map_err(ParseFailure::Invalid)?;
    Ok(config)
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
