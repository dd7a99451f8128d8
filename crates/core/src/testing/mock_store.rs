//! Mock artifact store for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncRead;
use tokio::sync::RwLock;

use crate::batch::InputArtifact;
use crate::storage::{ArtifactStore, FsArtifactStore, StorageError, StorageRef};

/// Artifact store over a private temporary directory that records removals.
///
/// Bytes live on disk so real readers (the archive builder, the image
/// transformer) work against it. The directory disappears with the store.
///
/// # Example
///
/// ```rust,ignore
/// use pressroom_core::testing::MockArtifactStore;
///
/// let store = MockArtifactStore::new();
/// let input = store.put_input("a.jpg", b"bytes").await;
///
/// // ... run a batch ...
///
/// assert_eq!(store.removal_count(&input.storage_ref).await, 1);
/// ```
#[derive(Debug)]
pub struct MockArtifactStore {
    dir: TempDir,
    inner: FsArtifactStore,
    /// Every successful removal, in order.
    removals: Arc<RwLock<Vec<StorageRef>>>,
    /// References whose removal fails with an I/O error.
    failing_removals: Arc<RwLock<HashSet<StorageRef>>>,
    /// Whether `allocate` panics.
    panic_allocations: Arc<AtomicBool>,
}

impl Default for MockArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArtifactStore {
    /// Create a new mock store in a fresh temporary directory.
    ///
    /// Panics if the directory cannot be created; only meant for tests.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir for mock store");
        let inner = FsArtifactStore::new(dir.path());
        Self {
            dir,
            inner,
            removals: Arc::new(RwLock::new(Vec::new())),
            failing_removals: Arc::new(RwLock::new(HashSet::new())),
            panic_allocations: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Stores `data` under a fresh reference that keeps `name`'s extension.
    pub async fn put(&self, name: &str, data: &[u8]) -> StorageRef {
        let extension = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let artifact = self.inner.allocate(extension);
        self.inner
            .write(&artifact, data)
            .await
            .expect("mock store write failed");
        artifact
    }

    /// Stores `data` and wraps it as a batch input named `name`.
    pub async fn put_input(&self, name: &str, data: &[u8]) -> InputArtifact {
        InputArtifact::new(name, self.put(name, data).await)
    }

    /// Make removals of `artifact` fail.
    pub async fn fail_removal_of(&self, artifact: &StorageRef) {
        self.failing_removals.write().await.insert(artifact.clone());
    }

    /// Make every later `allocate` call panic.
    pub fn panic_on_allocate(&self) {
        self.panic_allocations.store(true, Ordering::SeqCst);
    }

    /// All successful removals, in order.
    pub async fn removals(&self) -> Vec<StorageRef> {
        self.removals.read().await.clone()
    }

    /// How many times `artifact` was successfully removed.
    pub async fn removal_count(&self, artifact: &StorageRef) -> usize {
        self.removals
            .read()
            .await
            .iter()
            .filter(|r| *r == artifact)
            .count()
    }

    /// Number of artifacts currently on disk.
    pub async fn artifact_count(&self) -> usize {
        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(self.dir.path()).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if entry.path().is_file() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Reads the bytes of an artifact.
    pub async fn read(&self, artifact: &StorageRef) -> Vec<u8> {
        tokio::fs::read(artifact.as_path())
            .await
            .expect("mock store read failed")
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn allocate(&self, extension: &str) -> StorageRef {
        if self.panic_allocations.load(Ordering::SeqCst) {
            panic!("mock store allocation panic");
        }
        self.inner.allocate(extension)
    }

    async fn write(&self, artifact: &StorageRef, data: &[u8]) -> Result<u64, StorageError> {
        self.inner.write(artifact, data).await
    }

    async fn write_stream(
        &self,
        artifact: &StorageRef,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, StorageError> {
        self.inner.write_stream(artifact, reader).await
    }

    async fn size(&self, artifact: &StorageRef) -> Result<u64, StorageError> {
        self.inner.size(artifact).await
    }

    async fn exists(&self, artifact: &StorageRef) -> bool {
        self.inner.exists(artifact).await
    }

    async fn remove(&self, artifact: &StorageRef) -> Result<(), StorageError> {
        if self.failing_removals.read().await.contains(artifact) {
            return Err(StorageError::RemoveFailed {
                path: artifact.as_path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock failure"),
            });
        }
        self.inner.remove(artifact).await?;
        self.removals.write().await.push(artifact.clone());
        Ok(())
    }
}
