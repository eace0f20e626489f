//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits so a TOML file can provide a base layer that
//! environment variables then override.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Deployment mode. Everything that is not explicitly `development` is
/// treated as production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    /// Parse the `ENVIRONMENT` value.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for the widget server.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Development or production behaviour.
    pub mode: Mode,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Security hardening configuration.
    pub security: SecurityConfig,

    /// Where files are served from.
    pub content: ContentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Address string handed to the listener, e.g. `0.0.0.0:8000`.
    pub fn bind_address(&self) -> String {
        self.listener.address()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read and embed served content. Order matters: the
    /// first entry is the one named in `X-Frame-Options`.
    pub allowed_origins: Vec<String>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Dashboard origin allowed to supply scripts and open sockets under the
    /// production CSP.
    pub trusted_dashboard_origin: String,

    /// Substrings that make a request path forbidden.
    pub blocked_patterns: Vec<String>,

    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            trusted_dashboard_origin: "https://dashboard.retellai.com".to_string(),
            blocked_patterns: vec![
                ".py".to_string(),
                ".env".to_string(),
                ".git".to_string(),
                ".log".to_string(),
                "server-production".to_string(),
            ],
            server_name: "RetellChatServer/1.0".to_string(),
        }
    }
}

/// Content served by the file layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory that request paths are resolved against.
    pub root_dir: PathBuf,

    /// Document returned for `GET /`.
    pub default_document: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            default_document: "retell-seamless.html".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Directory holding `access.log` in production.
    pub log_dir: PathBuf,

    /// Used when `log_dir` cannot be created or written.
    pub fallback_log_dir: PathBuf,

    /// Prometheus exporter bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: PathBuf::from("/var/log/retell-chat"),
            fallback_log_dir: PathBuf::from("./logs"),
            metrics_address: None,
        }
    }
}
