//! Storage reference type.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque handle to one stored artifact.
///
/// Never serialized to clients; the cache exposes items by index instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageRef(PathBuf);

impl StorageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for StorageRef {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
