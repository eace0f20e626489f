//! Configuration loading from an optional TOML file and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{Mode, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split a comma-separated origin list. Entries are trimmed; empty entries
/// are kept so the "first origin is empty" rules keep their meaning.
pub fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|origin| origin.trim().to_string()).collect()
}

impl ServerConfig {
    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ENVIRONMENT") {
            self.mode = Mode::from_env_value(&value);
        }
        if let Some(value) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = parse_origins(&value);
        }
        if let Some(value) = lookup("HOST") {
            self.listener.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.listener.port = parse_number("PORT", value)?;
        }
        if let Some(value) = lookup("TRUSTED_DASHBOARD_ORIGIN") {
            self.security.trusted_dashboard_origin = value.trim().to_string();
        }
        if let Some(value) = lookup("SERVE_DIR") {
            self.content.root_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("DEFAULT_DOCUMENT") {
            self.content.default_document = value;
        }
        if let Some(value) = lookup("LOG_DIR") {
            self.observability.log_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.observability.log_level = value;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS") {
            self.timeouts.request_secs = parse_number("REQUEST_TIMEOUT_SECS", value)?;
        }
        if let Some(value) = lookup("METRICS_ADDRESS") {
            self.observability.metrics_address = Some(value).filter(|v| !v.is_empty());
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}

/// Load configuration: optional TOML file, then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServerConfig::default(),
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
