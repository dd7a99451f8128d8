//! Types for the transform module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::storage::StorageRef;

/// What a batch asks the transformer to do with each artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Re-encode any supported image as WebP.
    ConvertWebp,
    /// Recompress an image, keeping its name and format.
    Compress,
    /// Recompress a video as H.264/AAC MP4.
    CompressVideo,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConvertWebp => "convert_webp",
            Self::Compress => "compress",
            Self::CompressVideo => "compress_video",
        }
    }

    /// Extension of the artifact this kind produces for `original_name`.
    pub fn output_extension(&self, original_name: &str) -> String {
        match self {
            Self::ConvertWebp => "webp".to_string(),
            Self::Compress => extension_of(original_name).unwrap_or_else(|| "jpg".to_string()),
            Self::CompressVideo => "mp4".to_string(),
        }
    }

    /// Name the client sees for the processed artifact.
    pub fn processed_name(&self, original_name: &str) -> String {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("file");

        match self {
            Self::ConvertWebp => format!("{}.webp", stem),
            Self::Compress => original_name.to_string(),
            Self::CompressVideo => format!("{}_optimized.mp4", stem),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased extension of a client-supplied file name.
pub(crate) fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// A single transform request.
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub kind: TransformKind,
    /// Client-supplied name of the input; drives format detection.
    pub original_name: String,
    /// Artifact to read.
    pub input: StorageRef,
    /// Artifact to create.
    pub output: StorageRef,
}

/// Result of a successful transform.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub output: StorageRef,
    /// Input size in bytes.
    pub original_size: u64,
    /// Output size in bytes.
    pub final_size: u64,
    /// Wall time spent in the transform.
    pub duration_ms: u64,
}
