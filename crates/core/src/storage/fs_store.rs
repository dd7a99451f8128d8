//! Filesystem-backed artifact store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::ArtifactStore;
use super::types::StorageRef;

/// Stores artifacts as flat files named by UUID under a single root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it does not exist yet.
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::DirectoryCreationFailed {
                path: self.root.clone(),
                source,
            })
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn name(&self) -> &str {
        "fs"
    }

    fn allocate(&self, extension: &str) -> StorageRef {
        let extension = extension.trim_start_matches('.');
        let file_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        StorageRef::new(self.root.join(file_name))
    }

    async fn write(&self, artifact: &StorageRef, data: &[u8]) -> Result<u64, StorageError> {
        tokio::fs::write(artifact.as_path(), data)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: artifact.as_path().to_path_buf(),
                source,
            })?;
        Ok(data.len() as u64)
    }

    async fn write_stream(
        &self,
        artifact: &StorageRef,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, StorageError> {
        let write_failed = |source| StorageError::WriteFailed {
            path: artifact.as_path().to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(artifact.as_path())
            .await
            .map_err(write_failed)?;

        let copied = match tokio::io::copy(reader, &mut file).await {
            Ok(n) => file.flush().await.map(|_| n),
            Err(e) => Err(e),
        };
        drop(file);

        match copied {
            Ok(n) => Ok(n),
            Err(e) => {
                let _ = tokio::fs::remove_file(artifact.as_path()).await;
                Err(write_failed(e))
            }
        }
    }

    async fn size(&self, artifact: &StorageRef) -> Result<u64, StorageError> {
        let meta = tokio::fs::metadata(artifact.as_path())
            .await
            .map_err(|e| StorageError::from_io(artifact.as_path(), e))?;
        Ok(meta.len())
    }

    async fn exists(&self, artifact: &StorageRef) -> bool {
        tokio::fs::try_exists(artifact.as_path())
            .await
            .unwrap_or(false)
    }

    async fn remove(&self, artifact: &StorageRef) -> Result<(), StorageError> {
        match tokio::fs::remove_file(artifact.as_path()).await {
            Ok(()) => {
                debug!("Removed artifact {}", artifact);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                path: artifact.as_path().to_path_buf(),
            }),
            Err(source) => Err(StorageError::RemoveFailed {
                path: artifact.as_path().to_path_buf(),
                source,
            }),
        }
    }
}
