//! Rate limiting filter.
//!
//! Sits inside the authentication filter so the limit key can use the
//! verified subject. Rejections short-circuit the chain: the dispatch is
//! never invoked for a request over its window budget.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::AuthContext;
use crate::gateway::server::AppState;
use crate::observability::metrics;
use crate::ratelimit::Admission;

pub async fn rate_limit_filter(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limits = &state.config.rate_limit;
    if !limits.enabled {
        return next.run(request).await;
    }

    let key = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or(AuthContext::Anonymous)
        .rate_limit_key(addr.ip());
    let window = Duration::from_secs(limits.window_secs);

    match state
        .limiter
        .admit(&key, limits.requests_per_window, window)
    {
        Admission::Admitted { .. } => next.run(request).await,
        Admission::Rejected { retry_after } => {
            let retry_secs = (retry_after.as_secs_f64().ceil() as u64).max(1);
            tracing::warn!(
                client = %key,
                retry_after_secs = retry_secs,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(key.split(':').next().unwrap_or("unknown"));

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate limit exceeded",
                    "retry_after_secs": retry_secs,
                })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
            response
        }
    }
}
