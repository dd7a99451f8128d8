pub mod archive;
pub mod batch;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod service;
pub mod stats;
pub mod storage;
pub mod testing;
pub mod transform;

pub use archive::{ArchiveBuilder, ArchiveConfig, ArchiveEntry, ArchiveError, ArchiveFile};
pub use batch::{
    BatchConfig, BatchError, BatchOrchestrator, BatchOutcome, InputArtifact, ItemError,
    ProcessedItem,
};
pub use cache::{CacheConfig, CacheEntry, CacheStatus, Clock, ResultCache, SystemClock};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use service::{
    ArchiveDownload, FetchedItem, ItemSummary, ProcessingService, ServiceError, SubmitResponse,
};
pub use stats::BatchStats;
pub use storage::{ArtifactStore, FsArtifactStore, StorageError, StorageRef};
pub use transform::{MediaTransformer, TransformConfig, TransformKind, Transformer};
