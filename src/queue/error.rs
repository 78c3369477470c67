//! Error types for the job queue

use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T = ()> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid job state: {0}")]
    InvalidState(String),
}
