//! Error types for the transform module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::TransformKind;

/// Errors that can occur while transforming a single artifact.
#[derive(Debug, Error)]
pub enum TransformError {
    /// No configured transformer handles this kind of job.
    #[error("No transformer available for {kind}")]
    UnsupportedKind { kind: TransformKind },

    /// Input artifact not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The input could not be decoded.
    #[error("Failed to decode input: {reason}")]
    DecodeFailed { reason: String },

    /// The output could not be encoded.
    #[error("Failed to encode output: {reason}")]
    EncodeFailed { reason: String },

    /// External tool binary not found.
    #[error("Tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// External tool failed.
    #[error("Transform failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Transform timed out.
    #[error("Transform timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during transform.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Creates a new failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::DecodeFailed {
            reason: reason.into(),
        }
    }

    pub fn encode_failed(reason: impl Into<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
        }
    }
}
