//! Request-level facade over the batch orchestrator, result cache and
//! archive builder.
//!
//! This is the surface a transport binds to: submit a batch, fetch one
//! processed artifact, fetch all of them as an archive.

mod error;
mod processing;
mod types;

pub use error::ServiceError;
pub use processing::ProcessingService;
pub use types::{ArchiveDownload, FetchedItem, ItemSummary, SubmitResponse};
