//! Request path screening.
//!
//! # Responsibilities
//! - Forbid paths naming server sources, secrets, logs or VCS metadata (403)
//! - Reject parent-directory traversal (400)
//!
//! # Design Decisions
//! - Runs before any file is touched
//! - Denylist is checked before traversal
//! - Both the raw target and its percent-decoded form are screened. Escapes
//!   that do not decode to UTF-8 become U+FFFD instead of voiding the
//!   decoded check
//! - Traversal is rejected in every mode, development included

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::SecurityConfig;

const TRAVERSAL_TOKEN: &str = "../";

/// Why a path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("path matches blocked pattern {pattern:?}")]
    Forbidden { pattern: String },

    #[error("parent directory traversal")]
    Traversal,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Forbidden { .. } => StatusCode::FORBIDDEN,
            Rejection::Traversal => StatusCode::BAD_REQUEST,
        }
    }

    /// Body text sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            Rejection::Forbidden { .. } => "Access Forbidden",
            Rejection::Traversal => "Bad Request",
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Forbidden { .. } => "blocked_pattern",
            Rejection::Traversal => "traversal",
        }
    }
}

/// Screens raw request targets against the configured denylist.
#[derive(Debug, Clone)]
pub struct PathGuard {
    blocked_patterns: Vec<String>,
}

impl PathGuard {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            blocked_patterns: config
                .blocked_patterns
                .iter()
                .filter(|pattern| !pattern.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Check a raw request target (path plus optional query).
    pub fn check(&self, raw_path: &str) -> Result<(), Rejection> {
        let bytes = urlencoding::decode_binary(raw_path.as_bytes());
        let decoded = String::from_utf8_lossy(&bytes);

        for candidate in [raw_path, &*decoded] {
            if let Some(pattern) = self.blocked_pattern(candidate) {
                return Err(Rejection::Forbidden {
                    pattern: pattern.to_string(),
                });
            }
        }

        if raw_path.contains(TRAVERSAL_TOKEN) || has_parent_segment(&decoded) {
            return Err(Rejection::Traversal);
        }

        Ok(())
    }

    fn blocked_pattern(&self, path: &str) -> Option<&str> {
        self.blocked_patterns
            .iter()
            .find(|pattern| path.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

fn has_parent_segment(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    path.split(&['/', '\\'][..]).any(|segment| segment == "..")
}
