//! Configuration validation.
//!
//! # Responsibilities
//! - Gate startup: production must name its allowed origins, all over HTTPS
//! - Validate value ranges (timeouts > 0)
//! - Reject default documents that would escape the content root
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the listener binds

use thiserror::Error;

use crate::config::schema::ServerConfig;

const SECURE_SCHEME: &str = "https://";

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ALLOWED_ORIGINS is not set for the production environment")]
    MissingAllowedOrigins,

    #[error("non-HTTPS origin in production: {0}")]
    InsecureOrigin(String),

    #[error("trusted dashboard origin must use HTTPS in production: {0}")]
    InsecureDashboardOrigin(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("default document must be a plain file name: {0:?}")]
    InvalidDefaultDocument(String),
}

/// Check a configuration before it is accepted into the system.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.is_development() {
        let origins = &config.cors.allowed_origins;
        if origins.iter().all(|origin| origin.is_empty()) {
            errors.push(ValidationError::MissingAllowedOrigins);
        }

        // Empty entries come from stray commas and are skipped, not rejected.
        for origin in origins.iter().filter(|origin| !origin.is_empty()) {
            if !origin.starts_with(SECURE_SCHEME) {
                errors.push(ValidationError::InsecureOrigin(origin.clone()));
            }
        }

        let dashboard = &config.security.trusted_dashboard_origin;
        if !dashboard.starts_with(SECURE_SCHEME) {
            errors.push(ValidationError::InsecureDashboardOrigin(dashboard.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let document = &config.content.default_document;
    if document.is_empty() || document.contains('/') || document.contains('\\') || document.contains("..") {
        errors.push(ValidationError::InvalidDefaultDocument(document.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;

    fn production(origins: &[&str]) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.cors.allowed_origins = origins.iter().map(|o| o.to_string()).collect();
        config
    }

    #[test]
    fn production_requires_origins() {
        let errors = validate_config(&production(&[])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingAllowedOrigins]);

        // A lone empty entry is what `ALLOWED_ORIGINS=""` splits into.
        let errors = validate_config(&production(&[""])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingAllowedOrigins]);
    }

    #[test]
    fn production_rejects_plain_http_origin() {
        let errors = validate_config(&production(&["http://insecure.example.com"])).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InsecureOrigin("http://insecure.example.com".into())]
        );
    }

    #[test]
    fn production_accepts_https_origins() {
        assert!(validate_config(&production(&["https://a.example.com"])).is_ok());
        assert!(validate_config(&production(&["https://a.example.com", "https://b.example.com"])).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut config = production(&["http://a.example.com", "ftp://b.example.com"]);
        config.security.trusted_dashboard_origin = "http://dash.example.com".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
    }

    #[test]
    fn development_has_no_origin_constraints() {
        let mut config = production(&["http://localhost:3000"]);
        config.mode = Mode::Development;
        config.security.trusted_dashboard_origin = "http://localhost:4000".into();
        assert!(validate_config(&config).is_ok());

        config.cors.allowed_origins.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn default_document_must_stay_in_root() {
        let mut config = production(&["https://a.example.com"]);
        config.content.default_document = "../secret.html".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidDefaultDocument(_)));
    }
}
