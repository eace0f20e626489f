//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → path_guard.rs (denylist, traversal)
//!     → file layer
//! Outgoing response (any status):
//!     → headers.rs (CORS, CSP, framing, hardening, caching)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any path check failure
//! - Header policy is pure and computed per request
//! - No trust in client input

pub mod headers;
pub mod path_guard;

pub use headers::{HeaderPolicy, HeaderSet, HTML_CONTENT_TYPE};
pub use path_guard::{PathGuard, Rejection};
