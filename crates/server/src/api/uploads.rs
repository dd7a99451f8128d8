//! Upload handlers: multipart batches in, submit response out.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use futures::TryStreamExt;
use pressroom_core::{
    storage::remove_best_effort, ArtifactStore, InputArtifact, StorageRef, SubmitResponse,
    TransformKind,
};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::metrics::{UPLOADS_REJECTED, UPLOAD_BYTES};
use crate::state::AppState;

/// Multipart field carrying the files.
const FILES_FIELD: &str = "files";

/// POST /api/v1/images/convert
///
/// Convert every uploaded image to WebP.
pub async fn convert_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    process_upload(&state, multipart, TransformKind::ConvertWebp, Media::Image).await
}

/// POST /api/v1/images/compress
///
/// Recompress every uploaded image in its own format.
pub async fn compress_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    process_upload(&state, multipart, TransformKind::Compress, Media::Image).await
}

/// POST /api/v1/videos/compress
///
/// Recompress every uploaded video as H.264 MP4.
pub async fn compress_videos(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    process_upload(&state, multipart, TransformKind::CompressVideo, Media::Video).await
}

#[derive(Debug, Clone, Copy)]
enum Media {
    Image,
    Video,
}

impl Media {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        content_type
            .to_ascii_lowercase()
            .starts_with(&format!("{}/", self.as_str()))
    }
}

/// Streams every `files` part into storage, then hands the batch to the
/// service. On any upload error, everything stored so far is released.
async fn process_upload(
    state: &AppState,
    mut multipart: Multipart,
    kind: TransformKind,
    media: Media,
) -> Result<Json<SubmitResponse>, ApiError> {
    let max_bytes = state.config().server.max_upload_bytes;
    let mut staged = StagedUploads::new(Arc::clone(state.service().store()));

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                UPLOADS_REJECTED.with_label_values(&["malformed"]).inc();
                staged.release().await;
                return Err(ApiError::BadRequest(format!("Invalid multipart body: {}", e)));
            }
        };

        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("file")
            .to_string();
        let content_type = field.content_type().unwrap_or("").to_string();

        if !media.accepts(&content_type) {
            UPLOADS_REJECTED.with_label_values(&["media_type"]).inc();
            staged.release().await;
            return Err(ApiError::BadRequest(format!(
                "'{}' is not an {} file (got '{}')",
                original_name,
                media.as_str(),
                content_type
            )));
        }

        let artifact = staged.begin(&safe_extension(&original_name));
        let stream = field.map_err(std::io::Error::other);
        let mut reader = StreamReader::new(Box::pin(stream)).take(max_bytes.saturating_add(1));
        let written = staged.store.write_stream(&artifact, &mut reader).await;

        match written {
            Ok(written) if written > max_bytes => {
                UPLOADS_REJECTED.with_label_values(&["too_large"]).inc();
                staged.release().await;
                return Err(ApiError::PayloadTooLarge(format!(
                    "'{}' exceeds the {} byte upload limit",
                    original_name, max_bytes
                )));
            }
            Ok(written) => {
                debug!("Stored upload '{}' ({} bytes)", original_name, written);
                UPLOAD_BYTES
                    .with_label_values(&[media.as_str()])
                    .observe(written as f64);
                staged.commit(original_name);
            }
            Err(e) => {
                warn!("Failed to store upload '{}': {}", original_name, e);
                UPLOADS_REJECTED.with_label_values(&["malformed"]).inc();
                staged.release().await;
                return Err(ApiError::BadRequest(format!(
                    "Failed to read '{}': {}",
                    original_name, e
                )));
            }
        }
    }

    let response = state.service().submit(kind, staged.into_inputs()).await?;
    Ok(Json(response))
}

/// Uploads written so far for one request.
///
/// Until [`StagedUploads::into_inputs`] hands them to the service, the
/// request owns them: dropping the guard (client gone mid-upload) schedules
/// their removal, including a part that was still being written.
struct StagedUploads {
    store: Arc<dyn ArtifactStore>,
    inputs: Vec<InputArtifact>,
    in_progress: Option<StorageRef>,
}

impl StagedUploads {
    fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            inputs: Vec::new(),
            in_progress: None,
        }
    }

    /// Allocates the artifact for the next part.
    fn begin(&mut self, extension: &str) -> StorageRef {
        let artifact = self.store.allocate(extension);
        self.in_progress = Some(artifact.clone());
        artifact
    }

    /// Marks the part being written as a complete input.
    fn commit(&mut self, original_name: String) {
        if let Some(artifact) = self.in_progress.take() {
            self.inputs.push(InputArtifact::new(original_name, artifact));
        }
    }

    fn take_all(&mut self) -> Vec<StorageRef> {
        let mut refs: Vec<StorageRef> = self.inputs.drain(..).map(|i| i.storage_ref).collect();
        refs.extend(self.in_progress.take());
        refs
    }

    /// Removes everything staged and waits for it.
    async fn release(mut self) {
        let refs = self.take_all();
        for artifact in &refs {
            remove_best_effort(self.store.as_ref(), artifact, true).await;
        }
    }

    fn into_inputs(mut self) -> Vec<InputArtifact> {
        std::mem::take(&mut self.inputs)
    }
}

impl Drop for StagedUploads {
    fn drop(&mut self) {
        let refs = self.take_all();
        if refs.is_empty() {
            return;
        }

        debug!("Releasing {} abandoned upload(s)", refs.len());
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for artifact in &refs {
                        remove_best_effort(store.as_ref(), artifact, true).await;
                    }
                });
            }
            Err(_) => warn!(
                "No runtime to release {} abandoned upload(s)",
                refs.len()
            ),
        }
    }
}

/// Extension for the stored copy: the client's, if it is plain alphanumeric.
fn safe_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}
