use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{downloads, handlers, middleware::metrics_middleware, uploads};
use crate::state::AppState;

/// Multipart framing allowance on top of the file bytes.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let config = state.config();
    // Per-file size is enforced while streaming; this only caps a whole request.
    let body_limit = usize::try_from(config.server.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(config.batch.max_batch_size.max(1))
        .saturating_add(MULTIPART_OVERHEAD);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Uploads
        .route("/images/convert", post(uploads::convert_images))
        .route("/images/compress", post(uploads::compress_images))
        .route("/videos/compress", post(uploads::compress_videos))
        // Downloads
        .route(
            "/downloads/{cache_id}/archive",
            get(downloads::download_archive),
        )
        .route("/downloads/{cache_id}/{index}", get(downloads::download_item))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
