//! Error types for the archive module.

use thiserror::Error;

/// Errors that abort an archive build. No partial archive survives any of them.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Nothing to archive.
    #[error("No entries to archive")]
    Empty,

    /// A source artifact no longer exists.
    #[error("Source for '{name}' is missing")]
    SourceMissing { name: String },

    /// A source artifact exists but cannot be read.
    #[error("Source for '{name}' is unreadable: {source}")]
    SourceUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer failed.
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error on the temporary archive file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking build task did not complete.
    #[error("Archive task failed: {0}")]
    Task(String),
}
