//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup, and on each hot reload):
//!     RouteConfig[]
//!     → pattern.rs (compile exact / trailing-wildcard patterns)
//!     → table.rs (freeze as immutable RouteTable)
//!     → published atomically via ArcSwap
//!
//! Incoming Request (path):
//!     → table.rs resolve()
//!     → Return: most specific matching Route, or explicit no-match
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - No regex in the hot path (prefix matching only)
//! - Deterministic: longest fixed prefix wins, then declaration order

pub mod pattern;
pub mod table;

pub use pattern::PathPattern;
pub use table::{Route, RouteTable};
