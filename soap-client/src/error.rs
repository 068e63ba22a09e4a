//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// The device could not be reached or the connection broke
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// Response body is not a usable SOAP envelope
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// UPnP error code from a fault envelope
    #[error("SOAP fault: error code {0}")]
    Fault(u16),

    /// Non-success HTTP status without a fault envelope
    #[error("{action} failed: HTTP {status}")]
    Status { action: String, status: u16 },
}

impl SoapError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SoapError::Network(_) => true,
            SoapError::Status { status, .. } => *status >= 500,
            SoapError::Parse(_) | SoapError::Fault(_) => false,
        }
    }
}
