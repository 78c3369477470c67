//! Error types for the ingest engine

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T = ()> = Result<T, CoreError>;

/// Errors surfaced by the ingest engine
#[derive(Debug, Error)]
pub enum CoreError {
    /// File system or device failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation
    #[error("Operation cancelled")]
    Cancelled,

    /// Underlying hasher failed
    #[error("Hash error: {0}")]
    Hash(String),

    /// Destination exists with different content; never overwritten
    #[error("Archive conflict: {} exists with different content", .path.display())]
    ArchiveConflict { path: PathBuf },

    /// Post-copy re-check disagreed with the expected size or fingerprint
    #[error("Validation failed for {}: {reason}", .path.display())]
    ValidationFailed { path: PathBuf, reason: String },

    /// Session cannot be resumed deterministically
    #[error("Session {session_id} is missing the result blob for stage {stage}")]
    ResumeMissingBlob { session_id: String, stage: u8 },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid state for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration problem
    #[error("Config error: {0}")]
    Config(String),

    /// Domain invariant violated
    #[error("Invalid value: {0}")]
    Invalid(String),

    /// Job queue operation failed
    #[error("Queue error: {0}")]
    Queue(#[from] crate::queue::error::QueueError),
}

impl CoreError {
    /// Create a hash error
    pub fn hash<T: fmt::Display>(msg: T) -> Self {
        Self::Hash(msg.to_string())
    }

    /// Create an invalid-state error
    pub fn invalid_state<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidState(msg.to_string())
    }

    /// Create a not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Create a config error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Check whether this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
