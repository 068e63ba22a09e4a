//! Error types for raumfeld-state

use thiserror::Error;

/// Result type for raumfeld-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced to callers of the state layer
#[derive(Debug, Error)]
pub enum StateError {
    /// No update has completed yet
    #[error("State is not ready: no update has completed yet")]
    NotReady,

    /// Construction parameters were rejected; retrying will not help
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A room name that the host does not know
    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    /// No zone consists of exactly the given rooms
    #[error("No zone with rooms {0:?}")]
    ZoneNotFound(Vec<String>),

    /// The zone exists but no renderer location is known for it yet
    #[error("No renderer location for zone {0}")]
    NoZoneLocation(String),

    /// The host lists no media server
    #[error("No media server available")]
    NoMediaServer,

    /// `restore_zone` without a matching `save_zone`
    #[error("No saved state for zone {0:?}")]
    NoSavedZone(Vec<String>),

    /// The updater was stopped and cannot be restarted
    #[error("Updater already stopped")]
    AlreadyStopped,

    /// A wait did not complete in time
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The background worker could not be spawned
    #[error("Failed to spawn updater: {0}")]
    Spawn(String),

    /// Error from raumfeld-api
    #[error("API error: {0}")]
    Api(#[from] raumfeld_api::ApiError),

    /// Error from the host web service
    #[error("Web service error: {0}")]
    WebService(#[from] raumfeld_webservice::WebServiceError),
}

/// Why one refresh cycle did not produce a snapshot
///
/// The updater absorbs these: they delay freshness but never reach callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network trouble or a server-side failure; retry with backoff
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// The host answered with something unusable
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Some state documents have not been received yet
    #[error("Incomplete state, missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),
}

impl From<raumfeld_webservice::WebServiceError> for FetchError {
    fn from(error: raumfeld_webservice::WebServiceError) -> Self {
        if error.is_transient() {
            FetchError::Transient(error.to_string())
        } else {
            FetchError::Protocol(error.to_string())
        }
    }
}
