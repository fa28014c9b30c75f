//! Gateway dispatcher subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, filter chain, shared state)
//!     → filters (logging → authentication → rate limiting)
//!     → proxy.rs (route resolution, header rewrite, forward, relay)
//! ```
//!
//! # Design Decisions
//! - All dependencies (route table, verifier, limiter, client) are built
//!   at startup and passed through `AppState`; no globals
//! - Per-request errors become HTTP responses inside the chain; only
//!   startup errors are fatal

pub mod proxy;
pub mod server;

use thiserror::Error;

use crate::config::ConfigError;
use crate::routing::table::RouteError;

/// Fatal errors while bringing the gateway up. The process must not serve
/// traffic in any of these states.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

pub use proxy::GatewayError;
pub use server::{AppState, GatewayServer};
