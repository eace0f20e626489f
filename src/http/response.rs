//! Error responses.
//!
//! # Responsibilities
//! - Map request failures to status codes
//! - Hide internal detail from production clients
//!
//! # Design Decisions
//! - Every failure ends the request only; the server keeps running
//! - The full error is always logged, whatever the client sees

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::security::Rejection;

/// Failures while serving a single request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("request rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("file not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Rejected(rejection) => rejection.status(),
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to a response. `verbose` exposes internal detail and is only
    /// set in development.
    pub fn into_response_with_detail(self, verbose: bool) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Rejected(rejection) => rejection.public_message().to_string(),
            ServerError::NotFound => "File not found".to_string(),
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Server error");
                if verbose {
                    format!("Internal Server Error: {detail}")
                } else {
                    "Internal Server Error".to_string()
                }
            }
        };

        error_page(status, &message)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.into_response_with_detail(false)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ServerError::NotFound,
            _ => ServerError::Internal(err.to_string()),
        }
    }
}

/// Small HTML error document.
fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Error response</title></head>\n<body>\n\
         <h1>Error response</h1>\n<p>Error code: {}</p>\n<p>Message: {}.</p>\n</body>\n</html>\n",
        status.as_u16(),
        escape_html(message)
    );

    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
