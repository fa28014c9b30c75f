//! The gateway filter chain.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → logging.rs      (start timer, ensure request id)
//!     → authentication.rs (attach AuthContext, never rejects)
//!     → rate_limit.rs   (admit, or short-circuit with 429)
//!     → gateway::proxy  (route resolution + forward)
//!     ← logging.rs      (one latency/outcome record, every path)
//! ```
//!
//! # Design Decisions
//! - The chain is an explicit ordered stack built in
//!   `gateway::server::build_router`; order is visible in one place, not
//!   inferred from registration side effects
//! - Each filter is an async fn over (request, Next): it can pass through,
//!   attach request extensions, short-circuit with a response, or wrap the
//!   inner outcome
//! - Short-circuit responses still travel back through the outer filters,
//!   so the logging filter records them like any other outcome
//! - The request timeout is layered inside the logging wrap, so even a
//!   timed-out request yields its one completion record
//! - CORS sits outside the chain entirely; preflights never reach it

pub mod authentication;
pub mod cors;
pub mod logging;
pub mod rate_limit;
