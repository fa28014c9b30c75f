//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server → Bind listener → Serve
//!
//! Shutdown:
//!     SIGINT → signals.rs → Shutdown broadcast
//!     → axum drains connections, background tasks exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One broadcast channel fans the shutdown signal out to every task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
