//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → token.rs (structure, signature, expiry, required claims)
//!     → context.rs (AuthContext attached to the request)
//!     → downstream authorization decides access; the gateway never
//!       rejects on a bad token by itself
//! ```
//!
//! # Design Decisions
//! - Verification is stateless given the signing secret; the secret is
//!   process-wide configuration and mandatory at startup
//! - Every rejection kind maps to an anonymous context so public and
//!   protected routes share one filter chain

pub mod context;
pub mod token;

pub use context::AuthContext;
pub use token::{Claims, TokenVerifier, VerificationError};
