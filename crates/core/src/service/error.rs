//! Error types for the service facade.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::batch::{BatchError, ItemError};
use crate::storage::StorageError;

/// Request-level failures. Each one ends only the request that caused it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The submission was rejected before any work started.
    #[error(transparent)]
    Input(BatchError),

    /// No item was processed successfully.
    #[error("No file was processed successfully")]
    AllFailed { errors: Vec<ItemError> },

    /// Unknown or expired cache id.
    #[error("Results not found or expired; submit the files again")]
    CacheMiss,

    /// The cache entry exists but has no item at this index.
    #[error("No item at index {index}")]
    ItemNotFound { index: usize },

    /// The requested index is not a position at all.
    #[error("No item at index '{index}'")]
    InvalidIndex { index: String },

    /// Building the archive failed; nothing was delivered.
    #[error("Failed to build archive: {0}")]
    Archive(#[from] ArchiveError),

    /// A backing artifact could not be read.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The batch task died before producing a result.
    #[error("Batch processing was interrupted: {0}")]
    Task(String),
}

impl From<BatchError> for ServiceError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::AllFailed { errors } => Self::AllFailed { errors },
            other => Self::Input(other),
        }
    }
}

impl ServiceError {
    /// Whether the error means "nothing here", as opposed to a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CacheMiss | Self::ItemNotFound { .. } | Self::InvalidIndex { .. }
        )
    }
}
