//! Result cache implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::Clock;
use super::config::CacheConfig;
use super::types::{CacheEntry, CacheStatus, Eviction};
use crate::batch::ProcessedItem;
use crate::metrics;
use crate::stats::BatchStats;
use crate::storage::{remove_best_effort, ArtifactStore};

/// An entry plus the handle of its expiry timer.
struct Slot {
    entry: Arc<CacheEntry>,
    timer: Option<AbortHandle>,
}

/// State shared with timer and sweeper tasks. They hold it weakly so a
/// dropped cache does not stay alive through its own background tasks.
struct Inner {
    config: CacheConfig,
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Slot>>,
}

/// The single owner of the id → entry index.
///
/// `get` takes a read lock and runs concurrently with other lookups;
/// `put`, `remove`, expiry and sweep take the write lock, so an entry is
/// either fully present or absent and is taken out of the index exactly once.
/// Backing storage is released after the lock is dropped.
pub struct ResultCache {
    inner: Arc<Inner>,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ResultCache {
    pub fn new(config: CacheConfig, store: Arc<dyn ArtifactStore>, clock: Arc<dyn Clock>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                clock,
                entries: RwLock::new(HashMap::new()),
            }),
            running: AtomicBool::new(false),
            shutdown_tx,
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Starts the periodic sweep loop.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Result cache sweeper already running");
            return;
        }

        let interval = self.inner.config.sweep_interval();
        info!(
            "Starting result cache sweeper (ttl {}s, sweep every {}s)",
            self.inner.config.ttl_secs,
            interval.as_secs()
        );

        let weak = Arc::downgrade(&self.inner);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; nothing can be expired yet.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Result cache sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        inner.sweep().await;
                    }
                }
            }
        });

        *self.sweeper.lock().await = Some(handle);
    }

    /// Stops the sweeper and every pending timer.
    ///
    /// With `flush`, every entry is removed and its storage released.
    /// Without it, entries stay in the index until removed explicitly.
    pub async fn shutdown(&self, flush: bool) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }
        if let Some(handle) = self.sweeper.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Result cache sweeper ended abnormally: {}", e);
            }
        }

        let taken: Vec<Slot> = {
            let mut entries = self.inner.entries.write().await;
            if flush {
                let taken = entries.drain().map(|(_, slot)| slot).collect();
                metrics::CACHE_ENTRIES.set(0);
                taken
            } else {
                for slot in entries.values_mut() {
                    if let Some(timer) = slot.timer.take() {
                        timer.abort();
                    }
                }
                Vec::new()
            }
        };

        let flushed = taken.len();
        for slot in taken {
            if let Some(timer) = &slot.timer {
                timer.abort();
            }
            self.inner.release(&slot.entry, Eviction::Shutdown).await;
        }

        info!("Result cache shut down ({} entries flushed)", flushed);
    }

    /// Registers a batch result and arms its expiry timer. Returns the new id.
    ///
    /// The cache takes ownership of every item's storage.
    pub async fn put(&self, items: Vec<ProcessedItem>, stats: BatchStats) -> String {
        let created_at = self.inner.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.inner.config.ttl())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let item_count = items.len();

        let mut entries = self.inner.entries.write().await;

        let mut id = Uuid::new_v4().to_string();
        while entries.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let entry = Arc::new(CacheEntry {
            id: id.clone(),
            items,
            stats,
            created_at,
            expires_at,
        });

        let wait = time_left(created_at, expires_at);
        let timer = tokio::spawn(expiry_timer(
            Arc::downgrade(&self.inner),
            id.clone(),
            wait,
        ));

        entries.insert(
            id.clone(),
            Slot {
                entry,
                timer: Some(timer.abort_handle()),
            },
        );
        metrics::CACHE_ENTRIES.set(entries.len() as i64);
        drop(entries);

        info!(
            "Registered cache entry {} with {} item(s), expires at {}",
            id, item_count, expires_at
        );
        id
    }

    /// Looks up a live entry. Never extends its lifetime.
    ///
    /// An entry past `expires_at` is not found, whether or not it has been
    /// physically removed yet.
    pub async fn get(&self, id: &str) -> Option<Arc<CacheEntry>> {
        let now = self.inner.clock.now();
        let entries = self.inner.entries.read().await;
        entries
            .get(id)
            .filter(|slot| !slot.entry.is_expired_at(now))
            .map(|slot| Arc::clone(&slot.entry))
    }

    /// Removes an entry and releases its storage.
    ///
    /// Idempotent: unknown or already-removed ids are a no-op. Returns whether
    /// this call removed something.
    pub async fn remove(&self, id: &str) -> bool {
        let slot = {
            let mut entries = self.inner.entries.write().await;
            let slot = entries.remove(id);
            metrics::CACHE_ENTRIES.set(entries.len() as i64);
            slot
        };
        let Some(slot) = slot else {
            debug!("Cache entry {} already gone", id);
            return false;
        };

        if let Some(timer) = &slot.timer {
            timer.abort();
        }
        self.inner.release(&slot.entry, Eviction::Removed).await;
        true
    }

    /// Removes every expired entry. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = self.inner.clock.now();
        self.inner
            .entries
            .read()
            .await
            .values()
            .filter(|slot| !slot.entry.is_expired_at(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn status(&self) -> CacheStatus {
        let now = self.inner.clock.now();
        let entries = self.inner.entries.read().await;
        let live = entries
            .values()
            .filter(|slot| !slot.entry.is_expired_at(now))
            .count();

        CacheStatus {
            live,
            expired_pending: entries.len() - live,
            sweeper_running: self.running.load(Ordering::Relaxed),
        }
    }
}

impl Inner {
    /// Time until `id` expires; `None` if it is no longer indexed.
    async fn time_left(&self, id: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .get(id)
            .map(|slot| time_left(now, slot.entry.expires_at))
    }

    /// Evicts `id` if it is expired. Called from its own timer, so the
    /// timer handle is dropped, never aborted.
    async fn expire(&self, id: &str) -> bool {
        let now = self.clock.now();
        let slot = {
            let mut entries = self.entries.write().await;
            let expired = entries
                .get(id)
                .is_some_and(|slot| slot.entry.is_expired_at(now));
            if !expired {
                return false;
            }
            let slot = entries.remove(id);
            metrics::CACHE_ENTRIES.set(entries.len() as i64);
            slot
        };

        match slot {
            Some(slot) => {
                self.release(&slot.entry, Eviction::Timer).await;
                true
            }
            None => false,
        }
    }

    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<Slot> = {
            let mut entries = self.entries.write().await;
            let ids: Vec<String> = entries
                .iter()
                .filter(|(_, slot)| slot.entry.is_expired_at(now))
                .map(|(id, _)| id.clone())
                .collect();
            let taken = ids.iter().filter_map(|id| entries.remove(id)).collect();
            metrics::CACHE_ENTRIES.set(entries.len() as i64);
            taken
        };

        let count = expired.len();
        for slot in expired {
            if let Some(timer) = &slot.timer {
                timer.abort();
            }
            self.release(&slot.entry, Eviction::Sweep).await;
        }

        if count > 0 {
            info!("Sweep removed {} expired cache entries", count);
        } else {
            debug!("Sweep found no expired cache entries");
        }
        count
    }

    /// Deletes every item's storage. Failures are logged and skipped.
    async fn release(&self, entry: &CacheEntry, reason: Eviction) {
        metrics::CACHE_EVICTIONS
            .with_label_values(&[reason.as_str()])
            .inc();

        let mut failed = 0;
        for item in &entry.items {
            if !remove_best_effort(self.store.as_ref(), &item.storage_ref, false).await {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!(
                "Evicted cache entry {} ({}), {} of {} artifact(s) could not be removed",
                entry.id,
                reason.as_str(),
                failed,
                entry.items.len()
            );
        } else {
            debug!("Evicted cache entry {} ({})", entry.id, reason.as_str());
        }
    }
}

/// Sleeps until the entry's expiry, re-checking against the clock on wake.
async fn expiry_timer(inner: Weak<Inner>, id: String, mut wait: Duration) {
    loop {
        tokio::time::sleep(wait).await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        match inner.time_left(&id).await {
            None => return,
            Some(left) if left.is_zero() => {
                inner.expire(&id).await;
                return;
            }
            Some(left) => wait = left,
        }
    }
}

fn time_left(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Duration {
    (expires_at - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::storage::StorageRef;
    use crate::testing::MockArtifactStore;

    async fn item(store: &MockArtifactStore, name: &str) -> ProcessedItem {
        let storage_ref = store.put(name, &[1u8; 64]).await;
        ProcessedItem {
            original_name: name.to_string(),
            processed_name: name.to_string(),
            storage_ref,
            original_size: 128,
            final_size: 64,
            reduction_percent: 50.0,
        }
    }

    fn cache(store: Arc<MockArtifactStore>, clock: Arc<ManualClock>) -> ResultCache {
        ResultCache::new(CacheConfig::default(), store, clock)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);

        let items = vec![item(&store, "a.jpg").await, item(&store, "b.jpg").await];
        let stats = BatchStats::from_items(&items);
        let id = cache.put(items.clone(), stats).await;

        let entry = cache.get(&id).await.unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.items, items);
        assert_eq!(entry.stats, stats);
        assert_eq!(entry.expires_at - entry.created_at, chrono::Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_get_respects_expires_at_without_removal() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock.clone());

        let id = cache.put(vec![item(&store, "a.jpg").await], BatchStats::default()).await;

        clock.advance(chrono::Duration::minutes(30) - chrono::Duration::seconds(1));
        assert!(cache.get(&id).await.is_some());

        clock.advance(chrono::Duration::seconds(2));
        assert!(cache.get(&id).await.is_none());

        let status = cache.status().await;
        assert_eq!(status.live, 0);
        assert_eq!(status.expired_pending, 1);
    }

    #[tokio::test]
    async fn test_get_does_not_extend_lifetime() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock.clone());

        let id = cache.put(vec![item(&store, "a.jpg").await], BatchStats::default()).await;
        let before = cache.get(&id).await.unwrap().expires_at;

        clock.advance(chrono::Duration::minutes(10));
        let after = cache.get(&id).await.unwrap().expires_at;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);

        let it = item(&store, "a.jpg").await;
        let artifact = it.storage_ref.clone();
        let id = cache.put(vec![it], BatchStats::default()).await;

        assert!(cache.remove(&id).await);
        assert!(!cache.remove(&id).await);
        assert!(!cache.remove("never-existed").await);

        assert!(cache.get(&id).await.is_none());
        assert_eq!(store.removal_count(&artifact).await, 1);
    }

    #[tokio::test]
    async fn test_remove_continues_past_storage_failure() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);

        let first = item(&store, "a.jpg").await;
        let second = item(&store, "b.jpg").await;
        store.fail_removal_of(&first.storage_ref).await;
        let second_ref = second.storage_ref.clone();

        let id = cache.put(vec![first, second], BatchStats::default()).await;
        assert!(cache.remove(&id).await);
        assert_eq!(store.removal_count(&second_ref).await, 1);
        assert!(cache.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock.clone());

        let old_item = item(&store, "old.jpg").await;
        let old_ref = old_item.storage_ref.clone();
        let old = cache.put(vec![old_item], BatchStats::default()).await;

        clock.advance(chrono::Duration::minutes(20));
        let fresh = cache.put(vec![item(&store, "new.jpg").await], BatchStats::default()).await;

        clock.advance(chrono::Duration::minutes(15));
        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get(&old).await.is_none());
        assert!(cache.get(&fresh).await.is_some());
        assert!(!store.exists(&old_ref).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_timer_evicts_after_ttl() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = ResultCache::new(
            CacheConfig::default().with_ttl_secs(1),
            store.clone(),
            clock.clone(),
        );

        let it = item(&store, "a.jpg").await;
        let artifact = it.storage_ref.clone();
        let id = cache.put(vec![it], BatchStats::default()).await;

        clock.advance(chrono::Duration::seconds(2));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        for _ in 0..50 {
            if store.removal_count(&artifact).await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(cache.status().await.expired_pending, 0);
        assert_eq!(store.removal_count(&artifact).await, 1);
        // A later remove finds nothing and deletes nothing twice.
        assert!(!cache.remove(&id).await);
        assert_eq!(store.removal_count(&artifact).await, 1);
    }

    #[tokio::test]
    async fn test_early_timer_leaves_entry_alone() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = ResultCache::new(
            CacheConfig::default().with_ttl_secs(1),
            store.clone(),
            clock.clone(),
        );

        let id = cache.put(vec![item(&store, "a.jpg").await], BatchStats::default()).await;

        // Runtime time passes but the clock says the entry is still fresh.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(cache.get(&id).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_flush_releases_everything() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);
        cache.start().await;
        assert!(cache.status().await.sweeper_running);

        let a = item(&store, "a.jpg").await;
        let b = item(&store, "b.jpg").await;
        let refs: Vec<StorageRef> = vec![a.storage_ref.clone(), b.storage_ref.clone()];
        cache.put(vec![a], BatchStats::default()).await;
        cache.put(vec![b], BatchStats::default()).await;

        cache.shutdown(true).await;
        assert!(!cache.status().await.sweeper_running);
        assert!(cache.is_empty().await);
        for r in &refs {
            assert_eq!(store.removal_count(r).await, 1);
        }
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = Arc::new(MockArtifactStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = cache(store.clone(), clock);

        let a = cache.put(vec![item(&store, "a.jpg").await], BatchStats::default()).await;
        let b = cache.put(vec![item(&store, "b.jpg").await], BatchStats::default()).await;
        assert_ne!(a, b);
        assert_eq!(cache.len().await, 2);
    }
}
