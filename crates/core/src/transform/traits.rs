//! Trait definitions for the transform module.

use async_trait::async_trait;

use super::error::TransformError;
use super::types::{TransformJob, TransformKind, TransformOutput};

/// Recompresses or converts one artifact.
///
/// Implementations must not share mutable state across calls: the batch
/// orchestrator runs many `transform` calls at once on the same instance.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Returns the name of this transformer implementation.
    fn name(&self) -> &str;

    /// Whether this transformer handles jobs of `kind`.
    fn supports(&self, kind: TransformKind) -> bool;

    /// Reads `job.input`, writes `job.output` and reports both sizes.
    ///
    /// Never deletes `job.input`; the caller owns it.
    async fn transform(&self, job: TransformJob) -> Result<TransformOutput, TransformError>;

    /// Validates that the transformer is properly configured and ready.
    async fn validate(&self) -> Result<(), TransformError> {
        Ok(())
    }
}
