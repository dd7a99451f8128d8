//! The processing service.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::error::ServiceError;
use super::types::{ArchiveDownload, FetchedItem, ItemSummary, SubmitResponse};
use crate::archive::{ArchiveBuilder, ArchiveEntry};
use crate::batch::{BatchError, BatchOrchestrator, InputArtifact};
use crate::cache::{Clock, ResultCache};
use crate::config::Config;
use crate::stats::BatchStats;
use crate::storage::{remove_best_effort, ArtifactStore, StorageError};
use crate::transform::{TransformKind, Transformer};

/// Ties batch runs to cache entries and serves retrievals against them.
pub struct ProcessingService {
    orchestrator: Arc<BatchOrchestrator>,
    cache: Arc<ResultCache>,
    archives: ArchiveBuilder,
    store: Arc<dyn ArtifactStore>,
}

impl ProcessingService {
    pub fn new(
        orchestrator: BatchOrchestrator,
        cache: Arc<ResultCache>,
        archives: ArchiveBuilder,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            cache,
            archives,
            store,
        }
    }

    /// Wires every component from `config`. Archives are staged in the
    /// storage root. The cache sweeper is not started.
    pub fn from_config(
        config: &Config,
        transformer: Arc<dyn Transformer>,
        store: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let orchestrator =
            BatchOrchestrator::new(config.batch.clone(), transformer, Arc::clone(&store));
        let cache = Arc::new(ResultCache::new(
            config.cache.clone(),
            Arc::clone(&store),
            clock,
        ));
        let archives = ArchiveBuilder::new(config.archive.clone(), &config.storage.root);
        Self::new(orchestrator, cache, archives, store)
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Runs a batch and registers its successes under a new cache id.
    ///
    /// Takes ownership of every input, including on rejection. The batch and
    /// its registration run on their own task: dropping the returned future
    /// does not stop them, and the outputs still end up owned by the cache.
    pub async fn submit(
        &self,
        kind: TransformKind,
        inputs: Vec<InputArtifact>,
    ) -> Result<SubmitResponse, ServiceError> {
        let task = tokio::spawn(run_and_register(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.cache),
            Arc::clone(&self.store),
            kind,
            inputs,
        ));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Batch task for {} ended abnormally: {}", kind, e);
                Err(ServiceError::Task(e.to_string()))
            }
        }
    }

    /// Opens one processed artifact of a live entry.
    ///
    /// The file is opened while the entry is known to be live, so a later
    /// eviction cannot pull it out from under the download.
    pub async fn fetch_one(&self, cache_id: &str, index: usize) -> Result<FetchedItem, ServiceError> {
        let entry = self.cache.get(cache_id).await.ok_or(ServiceError::CacheMiss)?;
        let item = entry
            .item(index)
            .ok_or(ServiceError::ItemNotFound { index })?;

        let file = match tokio::fs::File::open(item.storage_ref.as_path()).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Evicted between the lookup and the open.
                if self.cache.get(cache_id).await.is_none() {
                    return Err(ServiceError::CacheMiss);
                }
                return Err(StorageError::NotFound {
                    path: item.storage_ref.as_path().to_path_buf(),
                }
                .into());
            }
            Err(e) => return Err(StorageError::Io(e).into()),
        };
        let size = file.metadata().await.map_err(StorageError::Io)?.len();
        debug!("Serving item {} of cache entry {}", index, cache_id);

        Ok(FetchedItem {
            storage_ref: item.storage_ref.clone(),
            name: item.processed_name.clone(),
            size,
            file,
        })
    }

    /// Builds an archive of every item in a live entry.
    pub async fn fetch_all(&self, cache_id: &str) -> Result<ArchiveDownload, ServiceError> {
        let entry = self.cache.get(cache_id).await.ok_or(ServiceError::CacheMiss)?;

        let entries = entry
            .items
            .iter()
            .map(|item| ArchiveEntry::new(item.storage_ref.clone(), item.processed_name.clone()))
            .collect();
        let archive = self.archives.build(entries).await?;

        Ok(ArchiveDownload {
            archive,
            name: format!("processed-{}.zip", cache_id),
        })
    }
}

/// Runs the batch, then hands its outputs to the cache.
async fn run_and_register(
    orchestrator: Arc<BatchOrchestrator>,
    cache: Arc<ResultCache>,
    store: Arc<dyn ArtifactStore>,
    kind: TransformKind,
    inputs: Vec<InputArtifact>,
) -> Result<SubmitResponse, ServiceError> {
    let refs: Vec<_> = inputs.iter().map(|i| i.storage_ref.clone()).collect();

    let outcome = match orchestrator.run(kind, inputs).await {
        Ok(outcome) => outcome,
        Err(e @ (BatchError::EmptyBatch | BatchError::TooManyItems { .. })) => {
            for artifact in &refs {
                remove_best_effort(store.as_ref(), artifact, true).await;
            }
            return Err(ServiceError::Input(e));
        }
        Err(e) => return Err(e.into()),
    };

    let stats = BatchStats::from_items(&outcome.items);
    let summaries: Vec<ItemSummary> = outcome
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemSummary::from_item(index, item))
        .collect();
    let total = outcome.items.len();

    let cache_id = cache.put(outcome.items, stats).await;

    info!(
        "Batch {} ({}): {} processed, {} failed, {:.2}% smaller",
        cache_id,
        kind,
        total,
        outcome.errors.len(),
        stats.average_reduction_percent
    );

    Ok(SubmitResponse {
        cache_id,
        total,
        total_original_size: stats.total_original_size,
        total_final_size: stats.total_final_size,
        average_reduction_percent: stats.average_reduction_percent,
        items: summaries,
        errors: outcome.errors,
    })
}
