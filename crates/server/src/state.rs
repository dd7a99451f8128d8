use pressroom_core::{Config, ProcessingService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    service: ProcessingService,
}

impl AppState {
    pub fn new(config: Config, service: ProcessingService) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &ProcessingService {
        &self.service
    }
}
