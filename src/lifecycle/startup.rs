//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to an exit code
//! - Validation runs before logging exists, so its diagnostics go to stderr
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{load_config, ConfigError, ServerConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net;
use crate::observability::{init_logging, metrics, LogSink};

/// Exit status for a rejected configuration.
pub const EXIT_CONFIG: u8 = 1;
/// Exit status when the listening socket cannot be bound.
pub const EXIT_BIND: u8 = 2;
/// Exit status when the server fails while running.
pub const EXIT_SERVE: u8 = 3;

/// What the binary was asked to do.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Optional TOML file applied before the environment.
    pub config_path: Option<PathBuf>,
    /// Validate the configuration and exit without binding.
    pub check_only: bool,
}

/// Run the server to completion and report how the process should exit.
pub async fn run(options: StartupOptions) -> ExitCode {
    let config = match load_config(options.config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            report_config_error(&err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if options.check_only {
        println!("Configuration OK ({} mode)", config.mode);
        return ExitCode::SUCCESS;
    }

    let sink = init_logging(&config);
    announce(&config, &sink);

    if let Some(address) = &config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    let listener = match net::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, "Cannot start listener");
            return ExitCode::from(EXIT_BIND);
        }
    };

    let shutdown = Arc::new(Shutdown::new());
    let stopped = shutdown.wait();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config);
    match server.run(listener, stopped).await {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::from(EXIT_SERVE)
        }
    }
}

fn report_config_error(err: &ConfigError) {
    match err {
        ConfigError::Validation(errors) => {
            for error in errors {
                eprintln!("WARNING: {error}");
            }
            eprintln!("Environment validation failed");
        }
        other => eprintln!("Configuration error: {other}"),
    }
}

fn announce(config: &ServerConfig, sink: &LogSink) {
    let root = config
        .content
        .root_dir
        .canonicalize()
        .unwrap_or_else(|_| config.content.root_dir.clone());

    let url = format!("http://{}", config.bind_address());

    tracing::info!(
        serving_from = %root.display(),
        url = %url,
        environment = %config.mode,
        "Widget server starting"
    );

    if config.is_development() {
        tracing::warn!("Development mode: permissive security settings");
    } else {
        tracing::info!(
            allowed_origins = %config.cors.allowed_origins.join(","),
            "Production mode: security hardened"
        );
    }

    if let LogSink::File(path) = sink {
        tracing::info!(path = %path.display(), "Writing access log");
    }
}
