//! Response header policy.
//!
//! # Responsibilities
//! - CORS: wildcard in development, allow-list echo in production
//! - Frame embedding: legacy `X-Frame-Options` plus CSP `frame-ancestors`
//! - Fixed hardening headers (nosniff, referrer, permissions)
//! - Cache control: HTML is never cached, assets for an hour
//!
//! # Design Decisions
//! - Pure: (config, request) → headers, no I/O
//! - Never fails; a value that cannot be a header value is skipped
//! - CSP `frame-ancestors` is the authoritative embedding control.
//!   `ALLOWALL` and `ALLOW-FROM` are obsolete values browsers ignore, kept
//!   for older embedders.
//! - The cache branch deliberately looks at the path component only. Matching
//!   the raw target would give `/widget.html?v=2` the one-hour asset policy;
//!   here a cache-busting query still counts as HTML and is never cached.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::{Mode, ServerConfig};
use crate::http::request::RequestContext;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const ALLOW_METHODS: &str = "GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";
const MAX_AGE_SECS: &str = "86400";

const DEVELOPMENT_CSP: &str = "frame-ancestors *;";

const PERMISSIONS_POLICY: &str = "microphone=(), camera=(), geolocation=(), payment=(), \
     usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const ASSET_CACHE: &str = "public, max-age=3600";

static X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
static X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");
static PERMISSIONS_POLICY_HEADER: HeaderName = HeaderName::from_static("permissions-policy");

/// Ordered set of response headers with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any earlier value under the same name
    /// while keeping its position.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn insert_static(&mut self, name: HeaderName, value: &'static str) {
        self.insert(name, HeaderValue::from_static(value));
    }

    /// Insert a dynamic value. Values that are not valid header text are
    /// dropped.
    pub fn insert_str(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => self.insert(name, value),
            Err(_) => tracing::debug!(header = %name, "Skipping unrepresentable header value"),
        }
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Convenience for tests and logging.
    pub fn get_str(&self, name: &HeaderName) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// Write every header into `headers`, overriding what is already there.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// Computes the response headers for a request.
///
/// Built once from the startup configuration and shared read-only between
/// requests.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    mode: Mode,
    allowed_origins: Vec<String>,
    production_csp: String,
    server_name: String,
}

impl HeaderPolicy {
    pub fn new(config: &ServerConfig) -> Self {
        let allowed_origins = config.cors.allowed_origins.clone();
        let production_csp = production_csp(&allowed_origins, &config.security.trusted_dashboard_origin);

        Self {
            mode: config.mode,
            allowed_origins,
            production_csp,
            server_name: config.security.server_name.clone(),
        }
    }

    /// The complete header set for one request.
    pub fn headers(&self, ctx: &RequestContext) -> HeaderSet {
        let mut set = HeaderSet::new();

        self.cors_headers(ctx, &mut set);
        self.frame_headers(&mut set);
        self.csp_header(&mut set);
        hardening_headers(&mut set);
        cache_headers(ctx.path_without_query(), &mut set);

        set.insert_str(header::SERVER, &self.server_name);
        set
    }

    /// Content type forced onto the body, if any. Everything else is left to
    /// the file layer's MIME detection.
    pub fn content_type_override(&self, path: &str) -> Option<&'static str> {
        if path == "/" || path.ends_with(".html") {
            Some(HTML_CONTENT_TYPE)
        } else {
            None
        }
    }

    /// Origin to place in `Access-Control-Allow-Origin`, if any.
    pub fn allowed_origin<'a>(&'a self, origin: Option<&'a str>) -> Option<&'a str> {
        match self.mode {
            Mode::Development => Some("*"),
            Mode::Production => {
                if let Some(origin) = origin.filter(|o| !o.is_empty()) {
                    if self.allowed_origins.iter().any(|allowed| allowed == origin) {
                        return Some(origin);
                    }
                }
                match self.allowed_origins.as_slice() {
                    [single] if !single.is_empty() => Some(single.as_str()),
                    _ => None,
                }
            }
        }
    }

    fn first_origin(&self) -> Option<&str> {
        self.allowed_origins
            .first()
            .map(String::as_str)
            .filter(|origin| !origin.is_empty())
    }

    fn cors_headers(&self, ctx: &RequestContext, set: &mut HeaderSet) {
        if let Some(origin) = self.allowed_origin(ctx.origin.as_deref()) {
            set.insert_str(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        set.insert_static(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS);
        set.insert_static(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS);
        set.insert_static(header::ACCESS_CONTROL_MAX_AGE, MAX_AGE_SECS);
    }

    fn frame_headers(&self, set: &mut HeaderSet) {
        match (self.mode, self.first_origin()) {
            (Mode::Development, _) => set.insert_static(header::X_FRAME_OPTIONS, "ALLOWALL"),
            (Mode::Production, Some(origin)) => {
                set.insert_str(header::X_FRAME_OPTIONS, &format!("ALLOW-FROM {origin}"))
            }
            (Mode::Production, None) => set.insert_static(header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        }
    }

    fn csp_header(&self, set: &mut HeaderSet) {
        match self.mode {
            Mode::Development => set.insert_static(header::CONTENT_SECURITY_POLICY, DEVELOPMENT_CSP),
            Mode::Production => set.insert_str(header::CONTENT_SECURITY_POLICY, &self.production_csp),
        }
    }
}

fn hardening_headers(set: &mut HeaderSet) {
    set.insert_static(header::X_CONTENT_TYPE_OPTIONS, "nosniff");
    set.insert_static(X_XSS_PROTECTION.clone(), "1; mode=block");
    set.insert_static(header::REFERRER_POLICY, "strict-origin-when-cross-origin");
    set.insert_static(X_PERMITTED_CROSS_DOMAIN_POLICIES.clone(), "none");
    set.insert_static(PERMISSIONS_POLICY_HEADER.clone(), PERMISSIONS_POLICY);
}

fn cache_headers(path: &str, set: &mut HeaderSet) {
    if path.ends_with(".html") {
        set.insert_static(header::CACHE_CONTROL, NO_CACHE);
        set.insert_static(header::PRAGMA, "no-cache");
        set.insert_static(header::EXPIRES, "0");
    } else {
        set.insert_static(header::CACHE_CONTROL, ASSET_CACHE);
    }
}

/// Production CSP. `frame-ancestors` lists the allowed origins when the first
/// one is set, otherwise only the page's own origin.
fn production_csp(allowed_origins: &[String], dashboard: &str) -> String {
    let frame_ancestors = match allowed_origins.first() {
        Some(first) if !first.is_empty() => allowed_origins
            .iter()
            .filter(|origin| !origin.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => "'self'".to_string(),
    };
    let dashboard_socket = websocket_origin(dashboard);

    format!(
        "frame-ancestors {frame_ancestors}; \
         default-src 'self' {dashboard}; \
         script-src 'self' 'unsafe-inline' {dashboard}; \
         style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: https:; \
         connect-src 'self' {dashboard} {dashboard_socket}; \
         font-src 'self' data:; \
         media-src 'self'; \
         object-src 'none'; \
         base-uri 'self';"
    )
}

/// `https://host` → `wss://host`, `http://host` → `ws://host`.
fn websocket_origin(origin: &str) -> String {
    if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        origin.to_string()
    }
}
