//! Logging filter: outermost wrap of the chain.
//!
//! Emits exactly one completion event per request, whether the inner chain
//! short-circuited, the dispatch failed, or the upstream answered.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::gateway::proxy::RouteName;
use crate::observability::metrics;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Outermost filter: assigns a request id when the caller did not send
/// one, times the rest of the chain, and records the outcome.
pub async fn logging_filter(mut request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(X_REQUEST_ID, value);
    }

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Request received"
    );

    let mut response = next.run(request).await;

    let status = response.status();
    let route = response
        .extensions()
        .get::<RouteName>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "none".to_string());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    let latency = start.elapsed();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        route = %route,
        latency_ms = latency.as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status.as_u16(), &route, start);

    response
}
