use soap_client::SoapError;
use thiserror::Error;

/// High-level API errors for Raumfeld UPnP operations
///
/// Abstracts the SOAP transport into failures a caller can act on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// Connection timeouts, DNS failures, or the device being unreachable.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response parsing error
    ///
    /// The device answered but the content did not have the expected shape.
    /// Also covers malformed device descriptions and DIDL-Lite metadata.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// SOAP fault returned by device
    #[error("SOAP fault: error code {0}")]
    SoapFault(u16),

    /// Device answered with an HTTP error and no fault envelope
    #[error("{action} failed with HTTP status {status}")]
    HttpStatus { action: String, status: u16 },

    /// Invalid parameter value
    ///
    /// Volume out of range, unknown play mode and similar.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The device description does not list the requested service
    #[error("Service {service} not offered by device at {location}")]
    ServiceNotFound {
        location: String,
        service: &'static str,
    },
}

impl ApiError {
    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::NetworkError(_) => true,
            ApiError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault(code) => ApiError::SoapFault(code),
            SoapError::Status { action, status } => ApiError::HttpStatus { action, status },
        }
    }
}
