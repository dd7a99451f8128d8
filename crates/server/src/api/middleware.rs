//! Request metrics for every route.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use prometheus::IntGauge;
use std::time::Instant;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Decrements the in-flight gauge even when the client goes away mid-request.
struct InFlight(&'static IntGauge);

impl InFlight {
    fn enter(gauge: &'static IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Records duration and count per (method, route, status).
///
/// Cache ids and item indexes are folded out of the route label. For
/// streamed downloads the duration covers the time to first byte only.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().as_str().to_owned();
    let route = normalize_path(request.uri().path());

    let response = {
        let _in_flight = InFlight::enter(&HTTP_REQUESTS_IN_FLIGHT);
        next.run(request).await
    };

    let status = response.status();
    let labels = [method.as_str(), route.as_str(), status.as_str()];
    HTTP_REQUEST_DURATION
        .with_label_values(&labels)
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}
