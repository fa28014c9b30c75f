//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! request → key derivation (subject or peer IP, see auth::context)
//!     → store.rs admit(key, limit, window)
//!     → Admitted: chain continues
//!     → Rejected: 429 with Retry-After, chain short-circuits
//! ```
//!
//! # Design Decisions
//! - Fixed windows: simple, and what the upstream services were sized for
//! - The store handle is constructed at startup and passed into the
//!   dispatcher explicitly; an unconfigured store is unrepresentable

pub mod store;

pub use store::{Admission, RateLimitStore};
