use thiserror::Error;

/// Failures of a single fetch against the QR service.
#[derive(Debug, Error)]
pub enum QrError {
    /// The request never got a response (DNS, refused connection, timeout).
    #[error("Request to QR service failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("QR Code generation failed")]
    Generation { status: http::StatusCode },

    /// The response arrived but its body could not be read.
    #[error("Failed to read QR image: {0}")]
    Body(#[source] reqwest::Error),
}

impl QrError {
    pub fn kind(&self) -> &'static str {
        match self {
            QrError::Transport(_) => "transport",
            QrError::Generation { .. } => "generation",
            QrError::Body(_) => "body",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Event id must be a positive integer")]
    NonPositiveEventId,

    #[error("Event id '{0}' is not a positive integer")]
    InvalidEventId(String),

    #[error("Payload must not be empty")]
    EmptyPayload,

    #[error("Give either an event id or a payload, not both")]
    Ambiguous,

    #[error("Give an event id or a payload")]
    Missing,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error opening config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid api_url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid listen address '{0}'")]
    InvalidListen(String),

    #[error("Invalid startup request: {0}")]
    Request(#[from] RequestError),

    #[error("Set either event_id or payload, not both")]
    Conflict,

    #[error("{0}")]
    Logging(String),
}
