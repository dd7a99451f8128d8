//! Batch orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Limits for a single batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Most inputs accepted in one batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Most transforms running at the same time, across all batches.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_transforms: usize,
}

fn default_max_batch_size() -> usize {
    50
}

fn default_max_parallel() -> usize {
    8
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_parallel_transforms: default_max_parallel(),
        }
    }
}

impl BatchConfig {
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_transforms = max;
        self
    }
}
