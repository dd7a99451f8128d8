//! Request and response types for the service facade.

use serde::{Deserialize, Serialize};

use crate::archive::ArchiveFile;
use crate::batch::{ItemError, ProcessedItem};
use crate::storage::StorageRef;

/// Per-item line of a submit response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    /// Position for `fetch_one`.
    pub index: usize,
    /// Name the download will carry.
    pub name: String,
    pub original_name: String,
    pub original_size: u64,
    pub final_size: u64,
    pub reduction_percent: f64,
}

impl ItemSummary {
    pub fn from_item(index: usize, item: &ProcessedItem) -> Self {
        Self {
            index,
            name: item.processed_name.clone(),
            original_name: item.original_name.clone(),
            original_size: item.original_size,
            final_size: item.final_size,
            reduction_percent: item.reduction_percent,
        }
    }
}

/// Result of a batch with at least one success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub cache_id: String,
    /// Number of successful items.
    pub total: usize,
    pub total_original_size: u64,
    pub total_final_size: u64,
    pub average_reduction_percent: f64,
    pub items: Vec<ItemSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

/// A single processed artifact, already open, ready to stream.
#[derive(Debug)]
pub struct FetchedItem {
    pub storage_ref: StorageRef,
    /// Download name.
    pub name: String,
    pub size: u64,
    /// Open handle; stays readable even if the entry is evicted meanwhile.
    pub file: tokio::fs::File,
}

/// An archive of a whole cache entry ready to stream.
#[derive(Debug)]
pub struct ArchiveDownload {
    pub archive: ArchiveFile,
    /// Download name, `processed-<cacheId>.zip`.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(errors: Vec<ItemError>) -> SubmitResponse {
        SubmitResponse {
            cache_id: "abc".to_string(),
            total: 1,
            total_original_size: 100,
            total_final_size: 50,
            average_reduction_percent: 50.0,
            items: vec![ItemSummary {
                index: 0,
                name: "a.webp".to_string(),
                original_name: "a.png".to_string(),
                original_size: 100,
                final_size: 50,
                reduction_percent: 50.0,
            }],
            errors,
        }
    }

    #[test]
    fn test_submit_response_camel_case_without_errors() {
        let json = serde_json::to_value(response(vec![])).unwrap();
        assert_eq!(json["cacheId"], "abc");
        assert_eq!(json["totalOriginalSize"], 100);
        assert_eq!(json["averageReductionPercent"], 50.0);
        assert_eq!(json["items"][0]["originalName"], "a.png");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_submit_response_includes_errors() {
        let json = serde_json::to_value(response(vec![ItemError::new("b.png", "bad")])).unwrap();
        assert_eq!(json["errors"][0]["name"], "b.png");
        assert_eq!(json["errors"][0]["message"], "bad");
    }
}
