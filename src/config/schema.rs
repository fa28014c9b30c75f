//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping path patterns to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Token verification settings.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin resource sharing policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration mapping a path pattern to an upstream base URI.
///
/// Declaration order matters: it breaks ties between patterns whose fixed
/// prefixes have equal length.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path pattern: an exact path, or a prefix ending in `/**` that
    /// matches the prefix and everything below it.
    pub path_pattern: String,

    /// Upstream base URI (scheme and authority, e.g. "http://alerts:8081").
    pub upstream: String,
}

/// Token verification settings.
///
/// The signing secret must be shared with the authentication service that
/// mints tokens; an empty secret is rejected at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. May also be supplied via the
    /// `GATEWAY_SIGNING_SECRET` environment variable, which takes
    /// precedence over the file.
    pub signing_secret: String,

    /// Signing algorithm: "HS256", "HS384" or "HS512".
    pub algorithm: String,

    /// Lifetime of tokens minted through `TokenVerifier::issue`, in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            algorithm: "HS512".to_string(),
            token_ttl_secs: 86_400,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per key per window.
    pub requests_per_window: u64,

    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 100,
            window_secs: 60,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout (client-facing) in seconds.
    pub request_secs: u64,

    /// Timeout for the forwarded upstream call in seconds. Exceeding it
    /// yields a 503 to the caller.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Cross-origin resource sharing policy, applied outermost so browser
/// preflights are answered before the filter chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable the CORS layer.
    pub enabled: bool,

    /// Allowed origins; `"*"` reflects the caller's origin.
    pub allowed_origins: Vec<String>,

    /// Allowed request methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers; `"*"` reflects the requested headers.
    pub allowed_headers: Vec<String>,

    /// Whether credentialed requests are allowed.
    pub allow_credentials: bool,

    /// How long browsers may cache a preflight answer, in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: vec!["*".to_string()],
            allow_credentials: true,
            max_age_secs: 8000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
