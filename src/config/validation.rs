//! Semantic configuration checks.
//!
//! Serde handles the syntactic layer; everything here is a rule the gateway
//! refuses to start without. In particular a missing signing secret or an
//! empty route table is fatal, never degraded into a half-working gateway.

use thiserror::Error;
use url::Url;

use crate::auth::token::parse_algorithm;
use crate::config::schema::GatewayConfig;
use crate::routing::pattern::PathPattern;

/// A single semantic validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("auth.signing_secret is empty (set it in the config file or via GATEWAY_SIGNING_SECRET)")]
    MissingSigningSecret,

    #[error("auth.algorithm {0:?} is not supported (expected HS256, HS384 or HS512)")]
    UnknownAlgorithm(String),

    #[error("route table is empty")]
    EmptyRouteTable,

    #[error("route {route:?}: invalid path pattern: {reason}")]
    InvalidPattern { route: String, reason: String },

    #[error("route {route:?}: invalid upstream: {reason}")]
    InvalidUpstream { route: String, reason: String },

    #[error("rate_limit.requests_per_window must be positive when rate limiting is enabled")]
    ZeroRateLimit,

    #[error("rate_limit.window_secs must be positive when rate limiting is enabled")]
    ZeroWindow,
}

/// Validate a parsed configuration. Collects every failure rather than
/// stopping at the first one.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.signing_secret.trim().is_empty() {
        errors.push(ValidationError::MissingSigningSecret);
    }
    if parse_algorithm(&config.auth.algorithm).is_none() {
        errors.push(ValidationError::UnknownAlgorithm(config.auth.algorithm.clone()));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::EmptyRouteTable);
    }
    for route in &config.routes {
        if let Err(e) = PathPattern::parse(&route.path_pattern) {
            errors.push(ValidationError::InvalidPattern {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }
        match Url::parse(&route.upstream) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    errors.push(ValidationError::InvalidUpstream {
                        route: route.name.clone(),
                        reason: format!("unsupported scheme {:?}", url.scheme()),
                    });
                } else if url.host_str().is_none() {
                    errors.push(ValidationError::InvalidUpstream {
                        route: route.name.clone(),
                        reason: "missing host".to_string(),
                    });
                } else if url.path() != "/" && !url.path().is_empty() {
                    // The original request path is appended verbatim, so a
                    // base path on the upstream would be silently dropped.
                    errors.push(ValidationError::InvalidUpstream {
                        route: route.name.clone(),
                        reason: "upstream must not carry a path".to_string(),
                    });
                }
            }
            Err(e) => errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.requests_per_window == 0 {
            errors.push(ValidationError::ZeroRateLimit);
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
