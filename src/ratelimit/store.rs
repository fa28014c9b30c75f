//! Fixed-window rate limit counters.
//!
//! # Responsibilities
//! - Count requests per key within consecutive, non-overlapping windows
//! - Admit or reject with the remaining window time
//!
//! # Design Decisions
//! - The dashmap entry guard holds the shard lock for the whole
//!   increment-and-set-expiry step, so whichever request creates the entry
//!   also sets the window boundary; later increments in the window share it
//! - Expired windows reset in place on the next admit; a periodic sweep
//!   evicts keys that went quiet

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Under the limit; `count` is this request's position in the window.
    Admitted { count: u64 },

    /// Over the limit for the rest of the window.
    Rejected { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    count: u64,
    expires_at: Instant,
}

/// Shared counter store keyed by client identity.
///
/// The only gateway component with concurrently mutated state; everything
/// else is immutable or request-scoped.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    windows: DashMap<String, Window>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically count a request against `key` and decide admission.
    pub fn admit(&self, key: &str, limit: u64, window: Duration) -> Admission {
        self.admit_at(key, limit, window, Instant::now())
    }

    fn admit_at(&self, key: &str, limit: u64, window: Duration, now: Instant) -> Admission {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window {
                count: 0,
                expires_at: now + window,
            });

        if now >= entry.expires_at {
            // Previous window elapsed; this request opens the next one.
            entry.count = 0;
            entry.expires_at = now + window;
        }

        entry.count += 1;
        if entry.count > limit {
            Admission::Rejected {
                retry_after: entry.expires_at.saturating_duration_since(now),
            }
        } else {
            Admission::Admitted { count: entry.count }
        }
    }

    /// Drop windows that expired before `now`. Called periodically; purely
    /// a memory reclaim, correctness never depends on it.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows.retain(|_, window| window.expires_at > now);
    }

    /// Number of live keys, for observability.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
