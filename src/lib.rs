//! Widget Server Library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
