//! Result cache lifecycle integration tests.
//!
//! These tests verify the cache with a manual clock and a temp-dir store:
//! - Expiry visibility and release of backing storage
//! - Background sweeper start/stop
//! - Shutdown with and without flush

use std::sync::Arc;
use std::time::Duration;

use pressroom_core::{
    cache::{CacheConfig, ManualClock, ResultCache},
    testing::MockArtifactStore,
    BatchStats, ProcessedItem,
};

struct TestHarness {
    cache: ResultCache,
    store: Arc<MockArtifactStore>,
    clock: Arc<ManualClock>,
}

impl TestHarness {
    fn new(config: CacheConfig) -> Self {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = ResultCache::new(config, store.clone(), clock.clone());
        Self {
            cache,
            store,
            clock,
        }
    }

    async fn items(&self, names: &[&str]) -> Vec<ProcessedItem> {
        let mut items = Vec::new();
        for name in names {
            let storage_ref = self.store.put(name, b"processed").await;
            items.push(ProcessedItem {
                original_name: name.to_string(),
                processed_name: name.to_string(),
                storage_ref,
                original_size: 18,
                final_size: 9,
                reduction_percent: 50.0,
            });
        }
        items
    }

    async fn put(&self, names: &[&str]) -> String {
        let items = self.items(names).await;
        let stats = BatchStats::from_items(&items);
        self.cache.put(items, stats).await
    }
}

#[tokio::test]
async fn test_entry_lifecycle_with_manual_clock() {
    let harness = TestHarness::new(CacheConfig::default().with_ttl_secs(60));
    let id = harness.put(&["a.webp", "b.webp"]).await;

    harness.clock.advance(chrono::Duration::seconds(59));
    let entry = harness.cache.get(&id).await.unwrap();
    assert_eq!(entry.items.len(), 2);
    assert_eq!(entry.stats.total_final_size, 18);

    harness.clock.advance(chrono::Duration::seconds(2));
    assert!(harness.cache.get(&id).await.is_none());

    let status = harness.cache.status().await;
    assert_eq!(status.live, 0);
    assert_eq!(status.expired_pending, 1);

    assert_eq!(harness.cache.sweep().await, 1);
    assert_eq!(harness.store.artifact_count().await, 0);
    assert_eq!(harness.cache.status().await.expired_pending, 0);
}

#[tokio::test]
async fn test_sweeper_evicts_in_background() {
    let harness = TestHarness::new(
        CacheConfig::default()
            .with_ttl_secs(60)
            .with_sweep_interval_secs(1),
    );
    let expired = harness.put(&["old.webp"]).await;
    harness.clock.advance(chrono::Duration::seconds(120));
    let fresh = harness.put(&["new.webp"]).await;

    harness.cache.start().await;
    assert!(harness.cache.status().await.sweeper_running);

    let mut evicted = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if harness.cache.len().await == 1 && harness.store.artifact_count().await == 1 {
            evicted = true;
            break;
        }
    }
    assert!(evicted, "sweeper did not evict the expired entry");
    assert!(harness.cache.get(&expired).await.is_none());
    assert!(harness.cache.get(&fresh).await.is_some());

    harness.cache.shutdown(false).await;
    assert!(!harness.cache.status().await.sweeper_running);
    // Non-flushing shutdown keeps live entries.
    assert!(harness.cache.get(&fresh).await.is_some());
}

#[tokio::test]
async fn test_shutdown_flush_releases_everything() {
    let harness = TestHarness::new(CacheConfig::default());
    harness.put(&["a.webp"]).await;
    harness.put(&["b.webp", "c.webp"]).await;
    harness.cache.start().await;

    harness.cache.shutdown(true).await;

    assert!(harness.cache.is_empty().await);
    assert_eq!(harness.store.artifact_count().await, 0);
}

#[tokio::test]
async fn test_remove_then_expiry_is_noop() {
    let harness = TestHarness::new(CacheConfig::default().with_ttl_secs(1));
    let id = harness.put(&["a.webp"]).await;
    let artifact = harness.cache.get(&id).await.unwrap().items[0].storage_ref.clone();

    assert!(harness.cache.remove(&id).await);
    assert!(!harness.cache.remove(&id).await);

    // Past the original deadline: the aborted timer must not release again.
    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(harness.store.removal_count(&artifact).await, 1);
}
