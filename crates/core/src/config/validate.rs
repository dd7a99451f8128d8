use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache lifetimes and sweep interval are positive
/// - Batch limits are positive
/// - Encoder settings are in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0".to_string(),
        ));
    }

    if config.cache.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.sweep_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.batch.max_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_batch_size cannot be 0".to_string(),
        ));
    }

    if config.batch.max_parallel_transforms == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_parallel_transforms cannot be 0".to_string(),
        ));
    }

    if !(1..=100).contains(&config.transform.jpeg_quality) {
        return Err(ConfigError::ValidationError(format!(
            "transform.jpeg_quality must be between 1 and 100, got {}",
            config.transform.jpeg_quality
        )));
    }

    if config.archive.compression_level > 9 {
        return Err(ConfigError::ValidationError(format!(
            "archive.compression_level must be between 0 and 9, got {}",
            config.archive.compression_level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_ttl_fails() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_batch_size_fails() {
        let mut config = Config::default();
        config.batch.max_batch_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_jpeg_quality_out_of_range() {
        let mut config = Config::default();
        config.transform.jpeg_quality = 0;
        assert!(validate_config(&config).is_err());
        config.transform.jpeg_quality = 101;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_compression_level_out_of_range() {
        let mut config = Config::default();
        config.archive.compression_level = 10;
        assert!(validate_config(&config).is_err());
    }
}
