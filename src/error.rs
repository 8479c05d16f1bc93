//! Error types for storage, repository and application layers.

use crate::types::ObjectId;
use thiserror::Error;

/// Failures of the underlying object or permission storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupted object {id}: {reason}")]
    CorruptedObject { id: ObjectId, reason: String },

    #[error("Invalid reference value for {name}")]
    InvalidReference { name: String },
}

/// Errors surfaced by repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a blob: {0}")]
    NotABlob(String),

    #[error("Concurrent modification of {reference}: expected {expected:?}, found {found:?}")]
    ConcurrentModification {
        reference: String,
        expected: Option<ObjectId>,
        found: Option<ObjectId>,
    },

    #[error("Object store unavailable: {0}")]
    ObjectStoreUnavailable(#[from] StorageError),
}

impl RepoError {
    /// Whether re-reading head and redoing the operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::ConcurrentModification { .. })
    }
}

/// Application-level errors (configuration, authorization, CLI)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
