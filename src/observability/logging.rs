//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route production logs to `access.log` as well as stdout
//! - Emit one access-log event per request
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Development logs to stdout only
//! - The log file sits behind a mutex so concurrent requests never interleave
//!   within a line
//! - Log level configurable via config and `RUST_LOG`

use std::fs::{self, File, OpenOptions};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use axum::http::{StatusCode, Version};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;
use crate::http::request::RequestContext;

pub const ACCESS_LOG_FILE: &str = "access.log";

/// Where log output ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    /// Stdout plus the given file.
    File(PathBuf),
}

/// Open `access.log` in `primary`, or in `fallback` when `primary` cannot be
/// created or written.
pub fn open_access_log(primary: &Path, fallback: &Path) -> Result<(File, PathBuf), std::io::Error> {
    match open_in(primary) {
        Ok(opened) => Ok(opened),
        Err(err) => {
            eprintln!(
                "Cannot write logs to {} ({}), using {}",
                primary.display(),
                err,
                fallback.display()
            );
            open_in(fallback)
        }
    }
}

fn open_in(dir: &Path) -> Result<(File, PathBuf), std::io::Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join(ACCESS_LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Install the global subscriber. Call once, before the listener binds.
pub fn init_logging(config: &ServerConfig) -> LogSink {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let (file, sink) = if config.is_development() {
        (None, LogSink::Stdout)
    } else {
        match open_access_log(&config.observability.log_dir, &config.observability.fallback_log_dir) {
            Ok((file, path)) => (Some(file), LogSink::File(path)),
            Err(err) => {
                eprintln!("Cannot open any log file ({err}), logging to stdout only");
                (None, LogSink::Stdout)
            }
        }
    };

    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    sink
}

/// Log one finished request.
pub fn record_access(
    client: Option<SocketAddr>,
    ctx: &RequestContext,
    version: Version,
    status: StatusCode,
) {
    let client_ip = client
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let request_line = format!("{} {} {:?}", ctx.method, ctx.path, version);

    tracing::info!(
        target: "access",
        client_ip = %client_ip,
        request = %request_line,
        status = status.as_u16(),
        user_agent = %ctx.user_agent,
        referer = %ctx.referer,
        "request served"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("widget-server-logs-{}", Uuid::new_v4()))
    }

    #[test]
    fn opens_primary_directory() {
        let primary = scratch_dir();
        let fallback = scratch_dir();

        let (mut file, path) = open_access_log(&primary, &fallback).unwrap();
        writeln!(file, "line").unwrap();

        assert_eq!(path, primary.join(ACCESS_LOG_FILE));
        assert!(!fallback.exists());
        let _ = fs::remove_dir_all(&primary);
    }

    #[test]
    fn falls_back_when_primary_unusable() {
        // A regular file where the primary directory should be cannot be
        // turned into a directory.
        let blocker = scratch_dir();
        fs::write(&blocker, b"not a directory").unwrap();
        let fallback = scratch_dir();

        let (_file, path) = open_access_log(&blocker, &fallback).unwrap();
        assert_eq!(path, fallback.join(ACCESS_LOG_FILE));

        let _ = fs::remove_file(&blocker);
        let _ = fs::remove_dir_all(&fallback);
    }

    #[test]
    fn appends_to_existing_log() {
        let dir = scratch_dir();
        {
            let (mut file, _) = open_access_log(&dir, &dir).unwrap();
            writeln!(file, "first").unwrap();
        }
        {
            let (mut file, _) = open_access_log(&dir, &dir).unwrap();
            writeln!(file, "second").unwrap();
        }

        let contents = fs::read_to_string(dir.join(ACCESS_LOG_FILE)).unwrap();
        assert_eq!(contents, "first\nsecond\n");
        let _ = fs::remove_dir_all(&dir);
    }
}
