//! Zip archive builder.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::config::ArchiveConfig;
use super::error::ArchiveError;
use super::names::unique_names;
use crate::metrics;
use crate::storage::StorageRef;

/// One member of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub source: StorageRef,
    /// Name inside the archive.
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: StorageRef, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }
}

/// A finished archive, rewound and ready to stream.
///
/// The file is anonymous: it has no directory entry and vanishes when the
/// handle is dropped, however the consumer stops reading.
#[derive(Debug)]
pub struct ArchiveFile {
    pub file: tokio::fs::File,
    pub size: u64,
    pub entries: usize,
}

/// Builds zip archives into anonymous temporary files.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    config: ArchiveConfig,
    scratch_dir: PathBuf,
}

impl ArchiveBuilder {
    /// `scratch_dir` holds the temporary archive while it is written.
    pub fn new(config: ArchiveConfig, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Builds an archive of `entries`, in order.
    ///
    /// Every source is opened before anything is written, so a missing or
    /// unreadable source fails the build without producing any output.
    pub async fn build(&self, entries: Vec<ArchiveEntry>) -> Result<ArchiveFile, ArchiveError> {
        let start = Instant::now();
        let level = self.config.compression_level.min(9);
        let scratch_dir = self.scratch_dir.clone();

        let result = tokio::task::spawn_blocking(move || build_blocking(&scratch_dir, entries, level))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok((file, size, count)) => {
                metrics::ARCHIVES_TOTAL.with_label_values(&["success"]).inc();
                info!(
                    "Built archive of {} file(s), {} bytes in {}ms",
                    count,
                    size,
                    start.elapsed().as_millis()
                );
                Ok(ArchiveFile {
                    file: tokio::fs::File::from_std(file),
                    size,
                    entries: count,
                })
            }
            Err(e) => {
                metrics::ARCHIVES_TOTAL.with_label_values(&["failed"]).inc();
                error!("Archive build failed: {}", e);
                Err(e)
            }
        }
    }
}

fn build_blocking(
    scratch_dir: &Path,
    entries: Vec<ArchiveEntry>,
    level: u32,
) -> Result<(File, u64, usize), ArchiveError> {
    if entries.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let names = unique_names(entries.iter().map(|e| e.name.as_str()));

    let mut sources = Vec::with_capacity(entries.len());
    for (entry, name) in entries.iter().zip(names) {
        let file = File::open(entry.source.as_path()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArchiveError::SourceMissing {
                    name: entry.name.clone(),
                }
            } else {
                ArchiveError::SourceUnreadable {
                    name: entry.name.clone(),
                    source: e,
                }
            }
        })?;
        sources.push((name, file));
    }

    let options = if level == 0 {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)))
    };

    let mut tmp = tempfile::tempfile_in(scratch_dir)?;
    let count = sources.len();
    {
        let mut zip = ZipWriter::new(&mut tmp);
        for (name, mut source) in sources {
            debug!("Adding '{}' to archive", name);
            zip.start_file(name.as_str(), options)?;
            std::io::copy(&mut source, &mut zip).map_err(|e| ArchiveError::SourceUnreadable {
                name: name.clone(),
                source: e,
            })?;
        }
        zip.finish()?;
    }

    let size = tmp.seek(SeekFrom::End(0))?;
    tmp.seek(SeekFrom::Start(0))?;
    Ok((tmp, size, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockArtifactStore;
    use crate::storage::ArtifactStore;
    use std::io::Read;
    use tokio::io::AsyncReadExt;

    async fn read_all(mut archive: ArchiveFile) -> Vec<u8> {
        let mut bytes = Vec::new();
        archive.file.read_to_end(&mut bytes).await.unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_build_archive_with_all_members() {
        let store = MockArtifactStore::new();
        let a = store.put("a.webp", b"first artifact").await;
        let b = store.put("b.webp", &[42u8; 4096]).await;

        let builder = ArchiveBuilder::new(ArchiveConfig::default(), store.root());
        let archive = builder
            .build(vec![ArchiveEntry::new(a, "a.webp"), ArchiveEntry::new(b, "b.webp")])
            .await
            .unwrap();
        assert_eq!(archive.entries, 2);
        let size = archive.size;

        let bytes = read_all(archive).await;
        assert_eq!(bytes.len() as u64, size);

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);

        let mut first = String::new();
        zip.by_name("a.webp").unwrap().read_to_string(&mut first).unwrap();
        assert_eq!(first, "first artifact");

        let second = zip.by_name("b.webp").unwrap();
        assert_eq!(second.size(), 4096);
        assert!(second.compressed_size() < 4096);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_suffixed() {
        let store = MockArtifactStore::new();
        let a = store.put("x.jpg", b"one").await;
        let b = store.put("x.jpg", b"two").await;

        let builder = ArchiveBuilder::new(ArchiveConfig::default(), store.root());
        let archive = builder
            .build(vec![ArchiveEntry::new(a, "x.jpg"), ArchiveEntry::new(b, "x.jpg")])
            .await
            .unwrap();

        let zip = zip::ZipArchive::new(std::io::Cursor::new(read_all(archive).await)).unwrap();
        let names: Vec<_> = zip.file_names().collect();
        assert!(names.contains(&"x.jpg"));
        assert!(names.contains(&"x (1).jpg"));
    }

    #[tokio::test]
    async fn test_missing_source_fails_whole_build() {
        let store = MockArtifactStore::new();
        let a = store.put("a.png", b"a").await;
        let b = store.put("b.png", b"b").await;
        let c = store.put("c.png", b"c").await;
        store.remove(&b).await.unwrap();

        let before = store.artifact_count().await;
        let builder = ArchiveBuilder::new(ArchiveConfig::default(), store.root());
        let err = builder
            .build(vec![
                ArchiveEntry::new(a, "a.png"),
                ArchiveEntry::new(b, "b.png"),
                ArchiveEntry::new(c, "c.png"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, ArchiveError::SourceMissing { ref name } if name == "b.png"));
        // No temporary archive left behind.
        assert_eq!(store.artifact_count().await, before);
    }

    #[tokio::test]
    async fn test_empty_build_rejected() {
        let store = MockArtifactStore::new();
        let builder = ArchiveBuilder::new(ArchiveConfig::default(), store.root());
        assert!(matches!(builder.build(vec![]).await, Err(ArchiveError::Empty)));
    }

    #[tokio::test]
    async fn test_store_level_zero() {
        let store = MockArtifactStore::new();
        let a = store.put("a.bin", &[7u8; 1000]).await;

        let builder = ArchiveBuilder::new(ArchiveConfig { compression_level: 0 }, store.root());
        let archive = builder.build(vec![ArchiveEntry::new(a, "a.bin")]).await.unwrap();

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(read_all(archive).await)).unwrap();
        let member = zip.by_index(0).unwrap();
        assert_eq!(member.compression(), CompressionMethod::Stored);
    }
}
