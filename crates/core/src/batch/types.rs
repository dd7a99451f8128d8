//! Types for batch orchestration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageRef;
use crate::transform::TransformKind;

/// One uploaded artifact waiting to be transformed.
///
/// The batch task that receives it owns `storage_ref` and deletes it once.
#[derive(Debug, Clone)]
pub struct InputArtifact {
    pub original_name: String,
    pub storage_ref: StorageRef,
}

impl InputArtifact {
    pub fn new(original_name: impl Into<String>, storage_ref: StorageRef) -> Self {
        Self {
            original_name: original_name.into(),
            storage_ref,
        }
    }
}

/// A successfully transformed artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedItem {
    pub original_name: String,
    /// Name offered for download.
    pub processed_name: String,
    /// Transformed bytes; owned by the cache entry once registered.
    pub storage_ref: StorageRef,
    pub original_size: u64,
    pub final_size: u64,
    pub reduction_percent: f64,
}

/// A failed transform, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    #[serde(rename = "name")]
    pub original_name: String,
    pub message: String,
}

impl ItemError {
    pub fn new(original_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            message: message.into(),
        }
    }
}

/// Result of a batch with at least one success.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub kind: TransformKind,
    /// Successes, in submission order.
    pub items: Vec<ProcessedItem>,
    /// Failures, in submission order.
    pub errors: Vec<ItemError>,
}

/// Batch-level failures.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Nothing was submitted.
    #[error("No files were submitted")]
    EmptyBatch,

    /// More inputs than the configured maximum.
    #[error("Too many files: {count} submitted, at most {max} allowed")]
    TooManyItems { count: usize, max: usize },

    /// Every item failed; no outputs exist.
    #[error("No file was processed successfully")]
    AllFailed { errors: Vec<ItemError> },
}

impl BatchError {
    /// Whether the batch was rejected before any work started.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyBatch | Self::TooManyItems { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_error_serializes_name() {
        let err = ItemError::new("b.png", "decode failed");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["name"], "b.png");
        assert_eq!(json["message"], "decode failed");
    }

    #[test]
    fn test_input_error_classification() {
        assert!(BatchError::EmptyBatch.is_input_error());
        assert!(BatchError::TooManyItems { count: 5, max: 2 }.is_input_error());
        assert!(!BatchError::AllFailed { errors: vec![] }.is_input_error());
    }
}
