//! Request metadata and request IDs.
//!
//! # Responsibilities
//! - Capture the per-request context the header policy and access log need
//! - Generate a unique request ID (UUID v4) for every request
//!
//! # Design Decisions
//! - Context is built from borrowed request parts and owns its strings, so it
//!   can outlive the request it was taken from
//! - Request ID added as early as possible for tracing

use axum::http::{header, HeaderMap, HeaderName, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Metadata for one request. Created per request, dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// Path and query exactly as received.
    pub path: String,
    pub origin: Option<String>,
    pub user_agent: String,
    pub referer: String,
}

impl RequestContext {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Self {
            method: method.clone(),
            path,
            origin: header_str(headers, &header::ORIGIN).map(str::to_string),
            user_agent: header_str(headers, &header::USER_AGENT)
                .unwrap_or("Unknown")
                .to_string(),
            referer: header_str(headers, &header::REFERER)
                .unwrap_or("None")
                .to_string(),
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_parts(request.method(), request.uri(), request.headers())
    }

    /// The path component, without any query string.
    pub fn path_without_query(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Makes `x-request-id` values from random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4()
            .to_string()
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn captures_request_metadata() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/widget.html?theme=dark")
            .header("Origin", "https://a.example.com")
            .header("User-Agent", "Mozilla/5.0")
            .header("Referer", "https://a.example.com/page")
            .body(Body::empty())
            .unwrap();

        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.method, Method::GET);
        assert_eq!(ctx.path, "/widget.html?theme=dark");
        assert_eq!(ctx.path_without_query(), "/widget.html");
        assert_eq!(ctx.origin.as_deref(), Some("https://a.example.com"));
        assert_eq!(ctx.user_agent, "Mozilla/5.0");
        assert_eq!(ctx.referer, "https://a.example.com/page");
    }

    #[test]
    fn missing_headers_use_placeholders() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.origin, None);
        assert_eq!(ctx.user_agent, "Unknown");
        assert_eq!(ctx.referer, "None");
    }

    #[test]
    fn request_ids_are_unique() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let mut maker = RequestUuid;

        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
