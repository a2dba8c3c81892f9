//! Dashboard error types.

use thiserror::Error;

use crate::source::UploadRejection;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("API error: {0}")]
    Client(#[from] boxmon_client::ClientError),

    #[error("Transport error: {0}")]
    Transport(#[from] boxmon_transport::TransportError),

    #[error("{0}")]
    UploadRejected(#[from] UploadRejection),
}
