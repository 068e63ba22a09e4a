//! Error types for the host web service client

use thiserror::Error;

/// Errors that can occur while talking to the Raumfeld host web service
#[derive(Debug, Error)]
pub enum WebServiceError {
    /// Connection, timeout or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The host answered with a status other than 200 or 304
    #[error("Unexpected HTTP status {status} from {path}")]
    Status { path: &'static str, status: u16 },

    /// The response body could not be parsed
    #[error("Parse error in {document}: {message}")]
    Parse {
        document: &'static str,
        message: String,
    },
}

impl WebServiceError {
    /// Whether the same request may succeed when retried later
    pub fn is_transient(&self) -> bool {
        match self {
            WebServiceError::Network(_) => true,
            WebServiceError::Status { status, .. } => *status >= 500,
            WebServiceError::Parse { .. } => false,
        }
    }
}

/// Result type for web service operations
pub type Result<T> = std::result::Result<T, WebServiceError>;
