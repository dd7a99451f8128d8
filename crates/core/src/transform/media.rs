//! Dispatching transformer.

use async_trait::async_trait;
use std::sync::Arc;

use super::config::TransformConfig;
use super::error::TransformError;
use super::ffmpeg::FfmpegTransformer;
use super::raster::ImageTransformer;
use super::traits::Transformer;
use super::types::{TransformJob, TransformKind, TransformOutput};

/// Routes each job to the first registered transformer that supports its kind.
#[derive(Default, Clone)]
pub struct MediaTransformer {
    transformers: Vec<Arc<dyn Transformer>>,
}

impl MediaTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transformer. Earlier registrations win.
    pub fn with(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Image transformer always, ffmpeg when video is enabled.
    pub fn from_config(config: &TransformConfig) -> Self {
        let mut media = Self::new().with(Arc::new(ImageTransformer::new(config)));
        if config.ffmpeg.enabled {
            media = media.with(Arc::new(FfmpegTransformer::new(config.ffmpeg.clone())));
        }
        media
    }

    fn route(&self, kind: TransformKind) -> Option<&Arc<dyn Transformer>> {
        self.transformers.iter().find(|t| t.supports(kind))
    }
}

#[async_trait]
impl Transformer for MediaTransformer {
    fn name(&self) -> &str {
        "media"
    }

    fn supports(&self, kind: TransformKind) -> bool {
        self.route(kind).is_some()
    }

    async fn transform(&self, job: TransformJob) -> Result<TransformOutput, TransformError> {
        match self.route(job.kind) {
            Some(transformer) => transformer.transform(job).await,
            None => Err(TransformError::UnsupportedKind { kind: job.kind }),
        }
    }

    async fn validate(&self) -> Result<(), TransformError> {
        for transformer in &self.transformers {
            transformer.validate().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageRef;

    #[test]
    fn test_from_config_routes_by_kind() {
        let media = MediaTransformer::from_config(&TransformConfig::default());
        assert_eq!(media.route(TransformKind::Compress).unwrap().name(), "image");
        assert_eq!(media.route(TransformKind::ConvertWebp).unwrap().name(), "image");
        assert_eq!(media.route(TransformKind::CompressVideo).unwrap().name(), "ffmpeg");
    }

    #[tokio::test]
    async fn test_video_disabled() {
        let mut config = TransformConfig::default();
        config.ffmpeg.enabled = false;
        let media = MediaTransformer::from_config(&config);
        assert!(!media.supports(TransformKind::CompressVideo));

        let err = media
            .transform(TransformJob {
                kind: TransformKind::CompressVideo,
                original_name: "clip.mp4".to_string(),
                input: StorageRef::new("/in.mp4"),
                output: StorageRef::new("/out.mp4"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedKind { .. }));
    }
}
