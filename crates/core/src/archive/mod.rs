//! On-demand zip archives of a cache entry's items.

mod builder;
mod config;
mod error;
mod names;

pub use builder::{ArchiveBuilder, ArchiveEntry, ArchiveFile};
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use names::unique_names;
