//! Time-bounded, in-memory result cache.
//!
//! Holds the outputs of completed batches under opaque ids until they expire.
//! Each entry has a fixed `expires_at`, set once at creation; every validity
//! check (lookups, the per-entry timer, the periodic sweep) compares the
//! injected [`Clock`] against it, so the two expiry mechanisms cannot
//! disagree about what is live.
//!
//! The cache owns the storage behind every registered item and releases it
//! when the entry is destroyed.

mod clock;
mod config;
mod result_cache;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use result_cache::ResultCache;
pub use types::{CacheEntry, CacheStatus, Eviction};
