//! Transform module: the per-artifact recompression step.
//!
//! A [`Transformer`] turns one stored input artifact into one stored output
//! artifact and reports both sizes. The batch orchestrator treats it as an
//! opaque, independent call; nothing here knows about batches or caching.
//!
//! # Implementations
//!
//! - [`ImageTransformer`]: WebP conversion and same-format recompression of
//!   JPEG, PNG, WebP and GIF using the `image` codecs.
//! - [`FfmpegTransformer`]: H.264/AAC recompression of video through ffmpeg.
//! - [`MediaTransformer`]: dispatches a job to whichever of the above supports
//!   its [`TransformKind`].
//!
//! # Example
//!
//! ```ignore
//! use pressroom_core::transform::{MediaTransformer, TransformConfig, TransformJob, TransformKind};
//!
//! let transformer = MediaTransformer::from_config(&TransformConfig::default());
//! let output = transformer.transform(TransformJob {
//!     kind: TransformKind::ConvertWebp,
//!     original_name: "holiday.png".to_string(),
//!     input,
//!     output,
//! }).await?;
//! println!("{} -> {} bytes", output.original_size, output.final_size);
//! ```

mod config;
mod error;
mod ffmpeg;
mod raster;
mod media;
mod traits;
mod types;

pub use config::{FfmpegConfig, PngCompression, TransformConfig};
pub use error::TransformError;
pub use ffmpeg::FfmpegTransformer;
pub use raster::ImageTransformer;
pub use media::MediaTransformer;
pub use traits::Transformer;
pub use types::{TransformJob, TransformKind, TransformOutput};
