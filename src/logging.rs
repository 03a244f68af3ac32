use crate::error::ConfigError;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "QR_VIEWER_LOG";

/// Installs the global subscriber, `QR_VIEWER_LOG` wins over the configured level.
/// Does nothing if a subscriber is already set.
pub fn init(level: &str) -> Result<(), ConfigError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let level = std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string());
    let filter = EnvFilter::try_new(&level)
        .map_err(|e| ConfigError::Logging(format!("Invalid log level '{level}': {e}")))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigError::Logging(format!("Failed to install tracing subscriber: {e}")))
}
