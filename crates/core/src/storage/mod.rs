//! Artifact storage for uploaded inputs and transformed outputs.
//!
//! Every artifact the service touches lives behind a [`StorageRef`] handed out
//! by an [`ArtifactStore`]. Ownership of a reference moves from the upload
//! adapter to a batch task, and from the batch task to the result cache; the
//! last owner is responsible for calling [`ArtifactStore::remove`].

mod error;
mod fs_store;
mod traits;
mod types;

pub use error::StorageError;
pub use fs_store::FsArtifactStore;
pub use traits::ArtifactStore;
pub use types::StorageRef;

use tracing::{debug, warn};

/// Removes an artifact, logging instead of failing.
///
/// Returns whether the artifact was deleted by this call. With `missing_ok`,
/// an already-absent artifact is not worth a warning.
pub async fn remove_best_effort(
    store: &dyn ArtifactStore,
    artifact: &StorageRef,
    missing_ok: bool,
) -> bool {
    match store.remove(artifact).await {
        Ok(()) => true,
        Err(e) if missing_ok && e.is_not_found() => {
            debug!("Artifact {} already gone", artifact);
            false
        }
        Err(e) => {
            warn!("Failed to remove artifact {}: {}", artifact, e);
            false
        }
    }
}
