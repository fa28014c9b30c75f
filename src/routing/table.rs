//! Route table: compiled routes and lookup.
//!
//! # Responsibilities
//! - Compile route configuration into an immutable table
//! - Resolve a request path to the most specific matching route
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); hot reload
//!   replaces the whole table through `arc-swap`
//! - Among matching routes the longest fixed prefix wins; equal prefix
//!   lengths fall back to declaration order
//! - A `/**` catch-all, if configured, is just the shortest-prefix match
//!   and therefore naturally loses to every more specific route

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::RouteConfig;
use crate::routing::pattern::{PathPattern, PatternError};

/// Error compiling the route table from configuration.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {route:?}: {source}")]
    InvalidPattern {
        route: String,
        source: PatternError,
    },

    #[error("route {route:?}: invalid upstream URI: {reason}")]
    InvalidUpstream { route: String, reason: String },
}

/// A single compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Compiled path pattern.
    pub pattern: PathPattern,

    /// Upstream base URI (scheme + authority).
    pub upstream: Uri,
}

/// Immutable collection of routes in declaration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile a table from configuration, preserving declaration order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            let pattern = PathPattern::parse(&config.path_pattern).map_err(|source| {
                RouteError::InvalidPattern {
                    route: config.name.clone(),
                    source,
                }
            })?;
            let upstream: Uri =
                config
                    .upstream
                    .parse()
                    .map_err(|e: axum::http::uri::InvalidUri| RouteError::InvalidUpstream {
                        route: config.name.clone(),
                        reason: e.to_string(),
                    })?;
            if upstream.authority().is_none() || upstream.scheme().is_none() {
                return Err(RouteError::InvalidUpstream {
                    route: config.name.clone(),
                    reason: "upstream must be an absolute URI with scheme and host".to_string(),
                });
            }
            routes.push(Route {
                name: config.name.clone(),
                pattern,
                upstream,
            });
        }
        Ok(Self { routes })
    }

    /// Resolve a normalized request path (no query string) to a route.
    ///
    /// Evaluates every route; selects the match with the longest fixed
    /// prefix, ties broken by declaration order. Returns `None` when no
    /// pattern (including any catch-all) matches.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let mut best: Option<&Route> = None;
        for route in &self.routes {
            if !route.pattern.matches(path) {
                continue;
            }
            match best {
                // Strictly-greater keeps the earlier declaration on ties.
                Some(current)
                    if route.pattern.fixed_prefix_len()
                        <= current.pattern.fixed_prefix_len() => {}
                _ => best = Some(route),
            }
        }
        best
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
