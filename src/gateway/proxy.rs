//! Route dispatch and upstream forwarding.
//!
//! # Responsibilities
//! - Resolve the route table for the request path
//! - Rewrite the request URI to the upstream authority
//! - Strip hop-by-hop headers, stamp gateway headers, attach verified
//!   identity headers
//! - Relay the upstream response verbatim
//!
//! # Design Decisions
//! - No retries: an upstream failure is reported to the caller (502/503),
//!   never silently retried
//! - Identity headers come only from verified claims; inbound copies were
//!   removed by the authentication filter

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use thiserror::Error;

use crate::auth::AuthContext;
use crate::filters::authentication::{X_AUTH_ROLES, X_AUTH_SUBJECT};
use crate::gateway::server::AppState;

/// Millisecond timestamp stamped on every forwarded request.
pub const X_GATEWAY_TIMESTAMP: &str = "x-gateway-timestamp";

/// Name of the matched route, attached to the response so the logging
/// filter can label its completion record.
#[derive(Debug, Clone)]
pub struct RouteName(pub String);

/// Per-request dispatch failures, each translated to an HTTP response
/// locally; none of them crash the dispatcher or affect other requests.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no matching route for {0}")]
    RouteNotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream timed out after {}s", .0.as_secs())]
    UpstreamTimeout(Duration),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Hop-by-hop headers, stripped in both directions (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Innermost chain step: resolve and forward.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> axum::response::Response {
    let path = request.uri().path().to_string();

    let (route_name, upstream) = {
        let table = state.table.load();
        match table.resolve(&path) {
            Some(route) => (route.name.clone(), route.upstream.clone()),
            None => {
                tracing::warn!(path = %path, "No route matched");
                return GatewayError::RouteNotFound(path).into_response();
            }
        }
    };

    tracing::debug!(path = %path, route = %route_name, upstream = %upstream, "Route resolved");

    let mut response = match forward(&state, request, &upstream).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(route = %route_name, error = %e, "Forward failed");
            e.into_response()
        }
    };
    response.extensions_mut().insert(RouteName(route_name));
    response
}

/// Forward the request to the resolved upstream and relay the response.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    upstream: &Uri,
) -> Result<axum::response::Response, GatewayError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or(AuthContext::Anonymous);

    let (mut parts, body) = request.into_parts();

    // Graft the upstream scheme/authority onto the original path and query.
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = upstream.scheme().cloned();
    uri_parts.authority = upstream.authority().cloned();
    parts.uri = Uri::from_parts(uri_parts)
        .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

    strip_hop_by_hop(&mut parts.headers);
    // The client derives Host from the rewritten URI.
    parts.headers.remove(header::HOST);

    if let Some(claims) = auth.claims() {
        if let Ok(value) = HeaderValue::from_str(&claims.sub) {
            parts.headers.insert(X_AUTH_SUBJECT, value);
        }
        if let Ok(value) = HeaderValue::from_str(&claims.roles.join(",")) {
            parts.headers.insert(X_AUTH_ROLES, value);
        }
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    parts.headers.insert(
        X_GATEWAY_TIMESTAMP,
        HeaderValue::from_str(&now_ms.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    let upstream_request = Request::from_parts(parts, body);
    let timeout = Duration::from_secs(state.config.timeouts.upstream_secs);

    let response = tokio::time::timeout(timeout, state.client.request(upstream_request))
        .await
        .map_err(|_| GatewayError::UpstreamTimeout(timeout))?
        .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)).into_response())
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named by a Connection header are also hop-by-hop.
    let named: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
