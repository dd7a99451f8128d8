//! Size and reduction statistics for a set of processed items.

use serde::{Deserialize, Serialize};

use crate::batch::ProcessedItem;

/// Aggregate sizes for one batch. Computed once, never updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_original_size: u64,
    pub total_final_size: u64,
    pub average_reduction_percent: f64,
}

impl BatchStats {
    /// Sums sizes over `items` and derives the overall reduction.
    ///
    /// The average is weighted by size: it is the reduction of the totals,
    /// not the mean of per-item percentages.
    pub fn from_items(items: &[ProcessedItem]) -> Self {
        let total_original_size: u64 = items.iter().map(|i| i.original_size).sum();
        let total_final_size: u64 = items.iter().map(|i| i.final_size).sum();

        Self {
            total_original_size,
            total_final_size,
            average_reduction_percent: reduction_percent(total_original_size, total_final_size),
        }
    }
}

/// `(original - final) / original * 100`, rounded to 2 decimals.
///
/// Negative when the output grew. Zero when `original` is zero.
pub fn reduction_percent(original: u64, final_size: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let raw = (original as f64 - final_size as f64) / original as f64 * 100.0;
    round2(raw)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
