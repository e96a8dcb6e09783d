//! Structured logging setup

use crate::error::{Result, TradeCenterError};
use tracing::Level;

/// Logging options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    /// Emit one JSON object per line instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json: false,
        }
    }
}

/// Parse a level name such as "debug" or "INFO"
pub fn parse_level(name: &str) -> Result<Level> {
    name.trim()
        .parse::<Level>()
        .map_err(|_| TradeCenterError::Config(format!("Unknown log level: {}", name)))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, e.g. by the
/// embedding application.
pub fn init(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    }

    installed
}
