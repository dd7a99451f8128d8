//! Trait definitions for the storage module.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::types::StorageRef;

/// A store that owns the bytes behind [`StorageRef`]s.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Allocates a fresh, unused reference with the given extension.
    ///
    /// Nothing is written until [`ArtifactStore::write`] is called.
    fn allocate(&self, extension: &str) -> StorageRef;

    /// Writes `data` as the full content of `artifact`, returning the byte count.
    async fn write(&self, artifact: &StorageRef, data: &[u8]) -> Result<u64, StorageError>;

    /// Streams `reader` into `artifact` until EOF, returning the byte count.
    ///
    /// A failed write leaves nothing behind.
    async fn write_stream(
        &self,
        artifact: &StorageRef,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, StorageError>;

    /// Returns the size of a stored artifact in bytes.
    async fn size(&self, artifact: &StorageRef) -> Result<u64, StorageError>;

    /// Whether the artifact currently exists.
    async fn exists(&self, artifact: &StorageRef) -> bool;

    /// Deletes an artifact. Removing a missing artifact is [`StorageError::NotFound`].
    async fn remove(&self, artifact: &StorageRef) -> Result<(), StorageError>;
}
