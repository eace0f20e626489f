//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host, port)
//!     → listener.rs (resolve, bind)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - One request per accepted connection, handled on the Tokio runtime
//! - No state shared between connections beyond read-only config

pub mod listener;

pub use listener::{bind, ListenerError};
