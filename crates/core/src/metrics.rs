//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Batches (submissions, per-item results, transform durations)
//! - Result cache (live entries, evictions)
//! - Archives (builds by result)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches total by kind and result.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_batches_total", "Total batches processed"),
        &["kind", "result"], // result: "success", "partial", "failed", "rejected"
    )
    .unwrap()
});

/// Items total by kind and result.
pub static ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_items_total", "Total items transformed"),
        &["kind", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Single transform duration in seconds.
pub static TRANSFORM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pressroom_transform_duration_seconds",
            "Duration of a single transform",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0, 300.0]),
        &["kind"],
    )
    .unwrap()
});

/// Bytes saved by successful transforms.
pub static BYTES_SAVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pressroom_bytes_saved_total",
            "Bytes saved by transforms (original minus final, floored at zero)",
        ),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Live cache entries.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("pressroom_cache_entries", "Live result cache entries").unwrap()
});

/// Cache evictions by reason.
pub static CACHE_EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_cache_evictions_total", "Total cache evictions"),
        &["reason"], // "timer", "sweep", "removed", "shutdown"
    )
    .unwrap()
});

// =============================================================================
// Archive Metrics
// =============================================================================

/// Archive builds by result.
pub static ARCHIVES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pressroom_archives_total", "Total archives built"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Batches
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(ITEMS_TOTAL.clone()),
        Box::new(TRANSFORM_DURATION.clone()),
        Box::new(BYTES_SAVED.clone()),
        // Cache
        Box::new(CACHE_ENTRIES.clone()),
        Box::new(CACHE_EVICTIONS.clone()),
        // Archives
        Box::new(ARCHIVES_TOTAL.clone()),
    ]
}
