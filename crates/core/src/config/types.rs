use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::archive::ArchiveConfig;
use crate::batch::BatchConfig;
use crate::cache::CacheConfig;
use crate::transform::TransformConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted size for a single uploaded file, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> u64 {
    20 * 1024 * 1024 // 20 MiB
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding uploaded inputs and transformed outputs.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    std::env::temp_dir().join("pressroom")
}

/// Sanitized config for API responses (filesystem layout hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
    pub archive: ArchiveConfig,
    pub jpeg_quality: u8,
    pub video_enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            cache: config.cache.clone(),
            batch: config.batch.clone(),
            archive: config.archive.clone(),
            jpeg_quality: config.transform.jpeg_quality,
            video_enabled: config.transform.ffmpeg.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_default_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.cache.sweep_interval_secs, 300);
        assert_eq!(config.archive.compression_level, 9);
    }

    #[test]
    fn test_deserialize_custom_storage_root() {
        let toml = r#"
[storage]
root = "/var/lib/pressroom"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.root.to_str().unwrap(), "/var/lib/pressroom");
    }

    #[test]
    fn test_deserialize_transform_section() {
        let toml = r#"
[transform]
jpeg_quality = 80
png_compression = "fast"

[transform.ffmpeg]
crf = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.transform.jpeg_quality, 80);
        assert_eq!(config.transform.ffmpeg.crf, 30);
        assert_eq!(config.transform.ffmpeg.preset, "slow");
    }

    #[test]
    fn test_sanitized_config() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.cache.ttl_secs, 1800);
        assert_eq!(sanitized.jpeg_quality, 65);

        let json = serde_json::to_value(&sanitized).unwrap();
        assert!(json.get("storage").is_none());
    }
}
