//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling E2E testing of uploads and
//! downloads without real media tooling.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use pressroom_core::archive::ArchiveBuilder;
use pressroom_core::batch::BatchOrchestrator;
use pressroom_core::testing::{ManualClock, MockArtifactStore, MockTransformer};
use pressroom_core::transform::ImageTransformer;
use pressroom_core::{Config, ProcessingService, ResultCache, Transformer};
use pressroom_server::AppState;

/// Re-export fixtures for test convenience
pub use pressroom_core::testing::fixtures;

const BOUNDARY: &str = "pressroom-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with controllable mocks for:
/// - Transforms (MockTransformer, or the real image transformer)
/// - Artifact storage (MockArtifactStore over a temp dir)
/// - Time (ManualClock driving cache expiry)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock transformer, unused when real images are enabled
    pub transformer: Arc<MockTransformer>,
    /// Store that records removals
    pub store: Arc<MockArtifactStore>,
    /// Clock behind cache expiry
    pub clock: Arc<ManualClock>,
    /// The app state, for reaching the cache directly
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response for downloads
#[derive(Debug)]
pub struct BytesResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadPart {
    pub fn file(file_name: &str, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            field: "files".to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Use the real image transformer instead of the mock
    pub real_images: bool,
    /// Override the per-file upload limit
    pub max_upload_bytes: Option<u64>,
    /// Override the batch size limit
    pub max_batch_size: Option<usize>,
}

impl TestConfig {
    pub fn with_real_images() -> Self {
        Self {
            real_images: true,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let store = Arc::new(MockArtifactStore::new());
        let transformer = Arc::new(MockTransformer::new());
        let clock = Arc::new(ManualClock::default());

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.server.port = 0; // Not used for in-process testing
        config.storage.root = store.root().to_path_buf();
        if let Some(max) = test_config.max_upload_bytes {
            config.server.max_upload_bytes = max;
        }
        if let Some(max) = test_config.max_batch_size {
            config.batch.max_batch_size = max;
        }

        let active: Arc<dyn Transformer> = if test_config.real_images {
            Arc::new(ImageTransformer::new(&config.transform))
        } else {
            transformer.clone()
        };

        let orchestrator = BatchOrchestrator::new(config.batch.clone(), active, store.clone());
        let cache = Arc::new(ResultCache::new(
            config.cache.clone(),
            store.clone(),
            clock.clone(),
        ));
        let archives = ArchiveBuilder::new(config.archive.clone(), store.root());
        let service = ProcessingService::new(orchestrator, cache, archives, store.clone());

        let state = Arc::new(AppState::new(config, service));
        let router = pressroom_server::create_router(Arc::clone(&state));

        Self {
            router,
            transformer,
            store,
            clock,
            state,
        }
    }

    /// Send a GET request and parse the body as JSON.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send_json(request).await
    }

    /// Send a GET request and keep the raw body.
    pub async fn get_bytes(&self, path: &str) -> BytesResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        BytesResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a multipart POST with the given parts.
    pub async fn upload(&self, path: &str, parts: &[UploadPart]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send_json(request).await
    }

    async fn send_json(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Encodes parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[UploadPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
