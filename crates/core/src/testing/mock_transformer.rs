//! Mock transformer for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::transform::{TransformError, TransformJob, TransformKind, TransformOutput, Transformer};

/// A recorded transform job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    /// The job that was submitted.
    pub job: TransformJob,
    /// Whether the transform succeeded.
    pub success: bool,
}

/// Mock implementation of the Transformer trait.
///
/// Provides controllable behavior for testing:
/// - Track transform jobs for assertions
/// - Fail or panic on specific input names
/// - Simulate slow transforms and observe concurrency
///
/// Successful transforms write an output half the size of the input
/// (rounded up), so reductions are predictable.
///
/// # Example
///
/// ```rust,ignore
/// use pressroom_core::testing::MockTransformer;
///
/// let transformer = MockTransformer::new();
/// transformer.fail_on("broken.png", "corrupt header").await;
///
/// let outcome = orchestrator.run(TransformKind::ConvertWebp, inputs).await?;
/// assert_eq!(transformer.job_count().await, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockTransformer {
    /// Recorded transforms.
    jobs: Arc<RwLock<Vec<RecordedTransform>>>,
    /// Failure messages keyed by original name.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// If set, every transform fails with this message.
    fail_all: Arc<RwLock<Option<String>>>,
    /// Original names whose transform panics.
    panics: Arc<RwLock<HashSet<String>>>,
    /// Simulated transform duration.
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockTransformer {
    /// Create a new mock transformer that succeeds on everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded transforms.
    pub async fn recorded_jobs(&self) -> Vec<RecordedTransform> {
        self.jobs.read().await.clone()
    }

    /// Get the number of transforms attempted.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Fail transforms of `original_name` with `message`.
    pub async fn fail_on(&self, original_name: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(original_name.to_string(), message.to_string());
    }

    /// Fail every transform with `message`.
    pub async fn fail_all(&self, message: &str) {
        *self.fail_all.write().await = Some(message.to_string());
    }

    /// Panic inside the transform of `original_name`.
    pub async fn panic_on(&self, original_name: &str) {
        self.panics.write().await.insert(original_name.to_string());
    }

    /// Set the simulated transform duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Highest number of transforms observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn failure_for(&self, original_name: &str) -> Option<String> {
        if let Some(message) = self.fail_all.read().await.clone() {
            return Some(message);
        }
        self.failures.read().await.get(original_name).cloned()
    }

    async fn run(&self, job: &TransformJob) -> Result<TransformOutput, TransformError> {
        let start = Instant::now();

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.read().await.contains(&job.original_name) {
            panic!("mock transformer panic for {}", job.original_name);
        }

        if let Some(message) = self.failure_for(&job.original_name).await {
            return Err(TransformError::failed(message, None));
        }

        let data = tokio::fs::read(job.input.as_path()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransformError::InputNotFound {
                    path: job.input.as_path().to_path_buf(),
                }
            } else {
                TransformError::Io(e)
            }
        })?;
        let output = &data[..data.len().div_ceil(2)];
        tokio::fs::write(job.output.as_path(), output).await?;

        Ok(TransformOutput {
            output: job.output.clone(),
            original_size: data.len() as u64,
            final_size: output.len() as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    fn name(&self) -> &str {
        "mock"
    }

    fn supports(&self, _kind: TransformKind) -> bool {
        true
    }

    async fn transform(&self, job: TransformJob) -> Result<TransformOutput, TransformError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let guard = InFlightGuard(&self.in_flight);
        let result = self.run(&job).await;
        drop(guard);

        self.jobs.write().await.push(RecordedTransform {
            job,
            success: result.is_ok(),
        });
        result
    }
}

/// Decrements the in-flight counter even when the transform panics.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
