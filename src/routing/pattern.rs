//! Path pattern syntax.
//!
//! # Responsibilities
//! - Parse exact patterns and trailing `/**` wildcard patterns
//! - Match request paths segment-aware
//!
//! # Design Decisions
//! - Two forms only: exact path, or fixed prefix plus `/**`
//! - `/api/alerts/**` matches `/api/alerts` and `/api/alerts/123`, but not
//!   `/api/alertsX` (the wildcard binds at a segment boundary)
//! - No regex to guarantee O(n) matching

use thiserror::Error;

/// Error for pattern strings the table refuses to compile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("'**' is only allowed as a trailing '/**' segment")]
    EmbeddedWildcard,
}

/// A compiled path pattern: a fixed prefix, optionally followed by a
/// match-everything-below wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    prefix: String,
    wildcard: bool,
}

impl PathPattern {
    /// Parse a pattern string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        if let Some(prefix) = raw.strip_suffix("/**") {
            if prefix.contains("**") {
                return Err(PatternError::EmbeddedWildcard);
            }
            return Ok(Self {
                prefix: prefix.to_string(),
                wildcard: true,
            });
        }

        if raw.contains("**") {
            return Err(PatternError::EmbeddedWildcard);
        }

        Ok(Self {
            prefix: raw.to_string(),
            wildcard: false,
        })
    }

    /// Returns true if the given request path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if !self.wildcard {
            return path == self.prefix;
        }
        if self.prefix.is_empty() {
            // Bare "/**" is the catch-all.
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// Length of the fixed (non-wildcard) prefix, used to rank competing
    /// matches: the longest fixed prefix wins.
    pub fn fixed_prefix_len(&self) -> usize {
        self.prefix.len()
    }

    /// Whether this pattern matches every path.
    pub fn is_catch_all(&self) -> bool {
        self.wildcard && self.prefix.is_empty()
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.wildcard {
            write!(f, "{}/**", self.prefix)
        } else {
            write!(f, "{}", self.prefix)
        }
    }
}
