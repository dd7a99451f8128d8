//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, writing or removing artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The artifact does not exist.
    #[error("Artifact not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to create the storage root.
    #[error("Failed to create storage directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an artifact.
    #[error("Failed to write artifact: {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete an artifact.
    #[error("Failed to remove artifact: {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Maps an I/O error on `path`, turning `NotFound` into [`StorageError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path: path.into() }
        } else {
            Self::Io(error)
        }
    }

    /// Whether the artifact was already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
