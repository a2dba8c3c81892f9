//! Transport error types.

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid channel URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported channel URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Channel is already connected")]
    AlreadyConnected,

    #[error("Channel is shut down")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
