//! Error type for API calls.

use thiserror::Error;

/// Errors returned by Materials Commons API operations.
#[derive(Debug, Clone, Error)]
pub enum McError {
    /// The server rejected the API key (HTTP 401).
    #[error("authentication")]
    Auth,
    /// The server answered with a non-success status other than 401.
    #[error("mcapi '{operation}' (HTTP status: {status}) - {message}")]
    Api {
        operation: String,
        status: u16,
        message: String,
    },
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid API url '{0}'")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for McError {
    fn from(value: reqwest::Error) -> Self {
        McError::Transport(value.to_string())
    }
}
