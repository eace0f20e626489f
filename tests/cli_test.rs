//! Startup gate through the real binary: environment in, exit status out.

use std::process::{Command, Output};

const VARIABLES: &[&str] = &[
    "CONFIG_FILE",
    "ENVIRONMENT",
    "ALLOWED_ORIGINS",
    "HOST",
    "PORT",
    "TRUSTED_DASHBOARD_ORIGIN",
    "SERVE_DIR",
    "DEFAULT_DOCUMENT",
    "LOG_DIR",
    "LOG_LEVEL",
    "REQUEST_TIMEOUT_SECS",
    "METRICS_ADDRESS",
];

fn check(vars: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_widget-server"));
    command.arg("--check");
    for name in VARIABLES {
        command.env_remove(name);
    }
    for (name, value) in vars {
        command.env(name, value);
    }
    command.output().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn insecure_production_origin_exits_with_config_status() {
    let output = check(&[
        ("ENVIRONMENT", "production"),
        ("ALLOWED_ORIGINS", "http://insecure.example.com"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("http://insecure.example.com"), "{stderr}");
    assert!(stderr.contains("Environment validation failed"), "{stderr}");
}

#[test]
fn missing_production_origins_exit_with_config_status() {
    let output = check(&[("ENVIRONMENT", "production")]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn https_production_origin_passes() {
    let output = check(&[
        ("ENVIRONMENT", "production"),
        ("ALLOWED_ORIGINS", "https://a.example.com"),
    ]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("production"));
}

#[test]
fn development_needs_no_origins() {
    let output = check(&[("ENVIRONMENT", "development")]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test]
fn malformed_port_exits_with_config_status() {
    let output = check(&[
        ("ENVIRONMENT", "production"),
        ("ALLOWED_ORIGINS", "https://a.example.com"),
        ("PORT", "eighty"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("PORT"));
}
