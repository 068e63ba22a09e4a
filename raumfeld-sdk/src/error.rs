use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("State error: {0}")]
    State(#[from] raumfeld_state::StateError),

    #[error("API error: {0}")]
    Api(#[from] raumfeld_api::ApiError),

    #[error("Web service error: {0}")]
    WebService(#[from] raumfeld_webservice::WebServiceError),

    #[error("No speaker listed for room {0}")]
    NoRenderer(String),

    #[error("No playable item matches {0:?}")]
    NothingFound(String),
}

impl SdkError {
    /// Whether the state layer rejected the call because no update completed yet
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SdkError::State(raumfeld_state::StateError::NotReady))
    }
}
