//! Concurrent batch runner.

use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::config::BatchConfig;
use super::types::{BatchError, BatchOutcome, InputArtifact, ItemError, ProcessedItem};
use crate::metrics;
use crate::stats::reduction_percent;
use crate::storage::{remove_best_effort, ArtifactStore};
use crate::transform::{TransformJob, TransformKind, Transformer};

/// Fans a batch out to one task per input and joins on all of them.
///
/// The semaphore is shared by every batch run through the same orchestrator,
/// so `max_parallel_transforms` bounds the whole process, not one request.
pub struct BatchOrchestrator {
    config: BatchConfig,
    transformer: Arc<dyn Transformer>,
    store: Arc<dyn ArtifactStore>,
    permits: Arc<Semaphore>,
}

impl BatchOrchestrator {
    pub fn new(
        config: BatchConfig,
        transformer: Arc<dyn Transformer>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_parallel_transforms.max(1)));
        Self {
            config,
            transformer,
            store,
            permits,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Transforms every input with `kind`.
    ///
    /// Each input is deleted exactly once whatever happens to its transform.
    /// Outputs of failed items are removed. Successes and failures keep the
    /// relative order of the submission.
    ///
    /// Rejected batches (empty, too large) consume nothing; the caller still
    /// owns and must release the inputs.
    pub async fn run(
        &self,
        kind: TransformKind,
        inputs: Vec<InputArtifact>,
    ) -> Result<BatchOutcome, BatchError> {
        if inputs.is_empty() {
            metrics::BATCHES_TOTAL
                .with_label_values(&[kind.as_str(), "rejected"])
                .inc();
            return Err(BatchError::EmptyBatch);
        }

        if inputs.len() > self.config.max_batch_size {
            let count = inputs.len();
            metrics::BATCHES_TOTAL
                .with_label_values(&[kind.as_str(), "rejected"])
                .inc();
            return Err(BatchError::TooManyItems {
                count,
                max: self.config.max_batch_size,
            });
        }

        let start = Instant::now();
        let total = inputs.len();
        let names: Vec<String> = inputs.iter().map(|i| i.original_name.clone()).collect();
        let input_refs: Vec<_> = inputs.iter().map(|i| i.storage_ref.clone()).collect();

        info!("Starting {} batch with {} item(s)", kind, total);

        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let transformer = Arc::clone(&self.transformer);
                let store = Arc::clone(&self.store);
                let permits = Arc::clone(&self.permits);
                tokio::spawn(run_item(kind, input, transformer, store, permits))
            })
            .collect();

        // join_all keeps submission order, so slot i belongs to input i.
        let slots = join_all(handles).await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Ok(Ok(item)) => items.push(item),
                Ok(Err(err)) => errors.push(err),
                Err(join_err) => {
                    warn!("Transform task for '{}' was lost: {}", names[idx], join_err);
                    // The task may have died before releasing its input.
                    remove_best_effort(self.store.as_ref(), &input_refs[idx], true).await;
                    errors.push(ItemError::new(
                        names[idx].clone(),
                        "Transform task was aborted",
                    ));
                }
            }
        }

        let result_label = if items.is_empty() {
            "failed"
        } else if errors.is_empty() {
            "success"
        } else {
            "partial"
        };
        metrics::BATCHES_TOTAL
            .with_label_values(&[kind.as_str(), result_label])
            .inc();

        info!(
            "Finished {} batch in {}ms: {} succeeded, {} failed",
            kind,
            start.elapsed().as_millis(),
            items.len(),
            errors.len()
        );

        if items.is_empty() {
            return Err(BatchError::AllFailed { errors });
        }

        Ok(BatchOutcome {
            kind,
            items,
            errors,
        })
    }
}

/// Runs one transform, then releases the input.
async fn run_item(
    kind: TransformKind,
    input: InputArtifact,
    transformer: Arc<dyn Transformer>,
    store: Arc<dyn ArtifactStore>,
    permits: Arc<Semaphore>,
) -> Result<ProcessedItem, ItemError> {
    let output_ref = store.allocate(&kind.output_extension(&input.original_name));
    let job = TransformJob {
        kind,
        original_name: input.original_name.clone(),
        input: input.storage_ref.clone(),
        output: output_ref.clone(),
    };

    let outcome = match permits.acquire().await {
        Ok(_permit) => {
            debug!("Transforming '{}' ({})", input.original_name, kind);
            let started = Instant::now();
            let result = AssertUnwindSafe(transformer.transform(job))
                .catch_unwind()
                .await;
            metrics::TRANSFORM_DURATION
                .with_label_values(&[kind.as_str()])
                .observe(started.elapsed().as_secs_f64());
            match result {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("Transform panicked".to_string()),
            }
        }
        Err(_) => Err("Transform pool is closed".to_string()),
    };

    remove_best_effort(store.as_ref(), &input.storage_ref, false).await;

    match outcome {
        Ok(output) => {
            metrics::ITEMS_TOTAL
                .with_label_values(&[kind.as_str(), "success"])
                .inc();
            metrics::BYTES_SAVED
                .with_label_values(&[kind.as_str()])
                .inc_by(output.original_size.saturating_sub(output.final_size));

            Ok(ProcessedItem {
                processed_name: kind.processed_name(&input.original_name),
                original_name: input.original_name,
                storage_ref: output.output,
                original_size: output.original_size,
                final_size: output.final_size,
                reduction_percent: reduction_percent(output.original_size, output.final_size),
            })
        }
        Err(message) => {
            warn!("Transform of '{}' failed: {}", input.original_name, message);
            metrics::ITEMS_TOTAL
                .with_label_values(&[kind.as_str(), "failed"])
                .inc();
            remove_best_effort(store.as_ref(), &output_ref, true).await;
            Err(ItemError::new(input.original_name, message))
        }
    }
}
