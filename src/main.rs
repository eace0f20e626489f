//! Widget Server
//!
//! Static file server for the chat-widget demo page, with CORS/CSP security
//! headers computed from the deployment mode and allowed origins.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server ──▶ security::path_guard ──▶ file layer
//!                                           │                                       │
//!     Client Response                       ▼                                       │
//!     ◀────────────── security::headers (every response, any status) ◀──────────────┘
//!
//!     config (env + optional TOML, validated at startup)
//!     observability (stdout / access.log, metrics)
//!     lifecycle (startup gate, signals, graceful shutdown)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use widget_server::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "widget-server")]
#[command(about = "Static file server for the chat widget demo", long_about = None)]
struct Cli {
    /// TOML file with base settings; environment variables override it.
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Validate the environment and exit without serving.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    lifecycle::run(StartupOptions {
        config_path: cli.config,
        check_only: cli.check,
    })
    .await
}
