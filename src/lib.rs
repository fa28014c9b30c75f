//! Edge Gateway Library
//!
//! An edge gateway that fronts a set of independently deployed backend
//! services: bearer-token authentication, per-caller fixed-window rate
//! limiting, longest-prefix route resolution, and request forwarding with
//! timing telemetry.

pub mod auth;
pub mod config;
pub mod filters;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod ratelimit;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use gateway::GatewayServer;
pub use lifecycle::Shutdown;
