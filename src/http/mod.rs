//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request context, request ID)
//!     → [security::path_guard screens the path]
//!     → file read / ServeDir
//!     → response.rs (error mapping)
//!     → [security::headers decorates the response]
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, RequestUuid, X_REQUEST_ID};
pub use response::ServerError;
pub use server::{AppState, HttpServer};
