use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request interrupted while waiting for rate limit")]
    Interrupted,

    #[error("API request failed: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("Document encoding failed: {0}")]
    Encoding(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed with status: {0}")]
    Status(u16),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Encoding(err.to_string())
    }
}
