//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (ENVIRONMENT, ALLOWED_ORIGINS, PORT, HOST, ...)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_origins, ConfigError};
pub use schema::{
    ContentConfig, CorsConfig, ListenerConfig, Mode, ObservabilityConfig, SecurityConfig, ServerConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
