//! Types for the result cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::batch::ProcessedItem;
use crate::stats::BatchStats;

/// One registered batch result. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: String,
    /// Successful items, in submission order.
    pub items: Vec<ProcessedItem>,
    pub stats: BatchStats,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is past its lifetime at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn item(&self, index: usize) -> Option<&ProcessedItem> {
        self.items.get(index)
    }
}

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Its own expiry timer fired.
    Timer,
    /// The periodic sweep found it expired.
    Sweep,
    /// Explicitly removed.
    Removed,
    /// Flushed on shutdown.
    Shutdown,
}

impl Eviction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Sweep => "sweep",
            Self::Removed => "removed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// Entries still retrievable.
    pub live: usize,
    /// Entries past expiry that no timer or sweep has removed yet.
    pub expired_pending: usize,
    pub sweeper_running: bool,
}
