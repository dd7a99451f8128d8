//! Still-image transformer built on the `image` codecs.

use async_trait::async_trait;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use super::config::{PngCompression, TransformConfig};
use super::error::TransformError;
use super::traits::Transformer;
use super::types::{extension_of, TransformJob, TransformKind, TransformOutput};

/// Target encoding for one image job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageTarget {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageTarget {
    fn for_job(kind: TransformKind, original_name: &str) -> Self {
        if kind == TransformKind::ConvertWebp {
            return Self::WebP;
        }
        match extension_of(original_name).as_deref() {
            Some("png") => Self::Png,
            Some("webp") => Self::WebP,
            Some("gif") => Self::Gif,
            // jpg, jpeg and anything unrecognised
            _ => Self::Jpeg,
        }
    }
}

/// Converts images to WebP or recompresses them in their own format.
///
/// Decoding and encoding are CPU-bound and run on the blocking pool.
#[derive(Debug, Clone)]
pub struct ImageTransformer {
    jpeg_quality: u8,
    png_compression: PngCompression,
    gif_speed: i32,
}

impl ImageTransformer {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality,
            png_compression: config.png_compression,
            gif_speed: config.gif_speed,
        }
    }

    /// Creates a transformer with default encoder settings.
    pub fn with_defaults() -> Self {
        Self::new(&TransformConfig::default())
    }

    fn encode(
        &self,
        image: &DynamicImage,
        target: ImageTarget,
        output: &Path,
    ) -> Result<(), TransformError> {
        let mut writer = BufWriter::new(File::create(output)?);

        match target {
            ImageTarget::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| TransformError::encode_failed(e.to_string()))?;
            }
            ImageTarget::Png => {
                let compression = match self.png_compression {
                    PngCompression::Fast => CompressionType::Fast,
                    PngCompression::Default => CompressionType::Default,
                    PngCompression::Best => CompressionType::Best,
                };
                let encoder =
                    PngEncoder::new_with_quality(&mut writer, compression, FilterType::Adaptive);
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| TransformError::encode_failed(e.to_string()))?;
            }
            ImageTarget::WebP => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                let encoder = WebPEncoder::new_lossless(&mut writer);
                rgba.write_with_encoder(encoder)
                    .map_err(|e| TransformError::encode_failed(e.to_string()))?;
            }
            ImageTarget::Gif => {
                let rgba = image.to_rgba8();
                // The trailer is written when the encoder drops, before the flush below.
                let mut encoder = GifEncoder::new_with_speed(&mut writer, self.gif_speed);
                encoder
                    .encode(&rgba, rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
                    .map_err(|e| TransformError::encode_failed(e.to_string()))?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn run_blocking(&self, job: &TransformJob) -> Result<(u64, u64), TransformError> {
        let input = job.input.as_path();
        let original_size = std::fs::metadata(input)
            .map_err(|_| TransformError::InputNotFound {
                path: input.to_path_buf(),
            })?
            .len();

        let image = ImageReader::open(input)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| TransformError::decode_failed(e.to_string()))?;

        let target = ImageTarget::for_job(job.kind, &job.original_name);
        self.encode(&image, target, job.output.as_path())?;

        let final_size = std::fs::metadata(job.output.as_path())?.len();
        Ok((original_size, final_size))
    }
}

#[async_trait]
impl Transformer for ImageTransformer {
    fn name(&self) -> &str {
        "image"
    }

    fn supports(&self, kind: TransformKind) -> bool {
        matches!(kind, TransformKind::ConvertWebp | TransformKind::Compress)
    }

    async fn transform(&self, job: TransformJob) -> Result<TransformOutput, TransformError> {
        if !self.supports(job.kind) {
            return Err(TransformError::UnsupportedKind { kind: job.kind });
        }

        let start = Instant::now();
        let this = self.clone();
        let output = job.output.clone();

        let (original_size, final_size) =
            tokio::task::spawn_blocking(move || this.run_blocking(&job))
                .await
                .map_err(|e| TransformError::failed(format!("encoder task failed: {}", e), None))??;

        Ok(TransformOutput {
            output,
            original_size,
            final_size,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
