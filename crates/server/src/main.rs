use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pressroom_core::{
    load_config, load_config_from_env, validate_config, ArtifactStore, FsArtifactStore,
    MediaTransformer, ProcessingService, SystemClock, Transformer,
};
use pressroom_server::{create_router, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path; without an explicit file, defaults plus env apply
    let config = match std::env::var("PRESSROOM_CONFIG").map(PathBuf::from) {
        Ok(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            load_config(&config_path)
                .with_context(|| format!("Failed to load config from {:?}", config_path))?
        }
        Err(_) => {
            info!("PRESSROOM_CONFIG not set, using defaults and environment");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Storage root: {:?}", config.storage.root);
    info!(
        "Cache TTL: {}s, sweep every {}s",
        config.cache.ttl_secs, config.cache.sweep_interval_secs
    );

    // Create artifact store
    let fs_store = FsArtifactStore::new(&config.storage.root);
    fs_store
        .init()
        .await
        .with_context(|| format!("Failed to create storage root {:?}", config.storage.root))?;
    let store: Arc<dyn ArtifactStore> = Arc::new(fs_store);

    // Create transformer
    let transformer = MediaTransformer::from_config(&config.transform);
    if config.transform.ffmpeg.enabled {
        if let Err(e) = transformer.validate().await {
            warn!("Video compression will fail until ffmpeg is available: {}", e);
        }
    }
    let transformer: Arc<dyn Transformer> = Arc::new(transformer);

    // Create processing service and start the cache sweeper
    let service =
        ProcessingService::from_config(&config, transformer, store, Arc::new(SystemClock));
    let cache = Arc::clone(service.cache());
    cache.start().await;

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), service));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Results do not survive a restart; release their storage now
    info!("Server shutting down...");
    cache.shutdown(true).await;
    info!("Result cache flushed");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
