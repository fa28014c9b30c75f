//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! filter chain & dispatcher produce:
//!     → logging.rs (structured tracing events, one completion per request)
//!     → metrics.rs (counters + latency histogram, Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request id flows from the logging filter through to the upstream
//! - Metric updates are cheap atomic operations; the exporter is optional

pub mod logging;
pub mod metrics;
