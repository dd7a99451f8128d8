//! Batch orchestration: run one transform per input concurrently and
//! partition the results.
//!
//! Every input gets its own task. Tasks share nothing but the transformer,
//! the store and a semaphore bounding how many transforms run at once. The
//! orchestrator waits for all of them before returning, so a slow item delays
//! the whole batch but a failing item never affects its siblings.
//!
//! # Example
//!
//! ```ignore
//! use pressroom_core::batch::{BatchConfig, BatchOrchestrator, InputArtifact};
//! use pressroom_core::transform::TransformKind;
//!
//! let orchestrator = BatchOrchestrator::new(BatchConfig::default(), transformer, store);
//! let outcome = orchestrator.run(TransformKind::ConvertWebp, inputs).await?;
//! println!("{} ok, {} failed", outcome.items.len(), outcome.errors.len());
//! ```

mod config;
mod orchestrator;
mod types;

pub use config::BatchConfig;
pub use orchestrator::BatchOrchestrator;
pub use types::{BatchError, BatchOutcome, InputArtifact, ItemError, ProcessedItem};
