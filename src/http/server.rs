//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (header policy, access log, timeout, request ID, tracing)
//! - Answer CORS preflight
//! - Screen paths, then serve HTML directly and everything else via `ServeDir`
//! - Bind server to listener with graceful shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{RequestContext, RequestUuid, X_REQUEST_ID};
use crate::http::response::ServerError;
use crate::observability::{logging, metrics};
use crate::security::{HeaderPolicy, PathGuard};

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub policy: Arc<HeaderPolicy>,
    pub guard: Arc<PathGuard>,
    pub files: ServeDir,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            policy: Arc::new(HeaderPolicy::new(&config)),
            guard: Arc::new(PathGuard::new(&config.security)),
            files: ServeDir::new(&config.content.root_dir).append_index_html_on_directories(true),
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the widget files.
pub struct HttpServer {
    router: Router,
    config: Arc<ServerConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::new(config);
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let routes = Router::new()
            .route("/", get(serve_path).options(preflight))
            .route("/{*path}", get(serve_path).options(preflight))
            .fallback(fallback);

        with_layers(routes, state)
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.mode,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Wrap `routes` in the middleware stack. The policy layer sits outside the
/// timeout, so a 408 carries the full header set too.
fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.timeouts.request_secs);

    routes
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(middleware::from_fn_with_state(state.clone(), apply_policy))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Applies the header policy to every response, whatever its status, and
/// writes the access log line.
async fn apply_policy(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::from_request(&request);
    let client = client_addr(&request);
    let version = request.version();

    let mut response = next.run(request).await;
    state.policy.headers(&ctx).apply_to(response.headers_mut());

    logging::record_access(client, &ctx, version, response.status());
    metrics::record_request(ctx.method.as_str(), response.status().as_u16(), start);
    response
}

/// CORS preflight: empty 200, headers come from the policy layer.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Targets no route matches, e.g. `OPTIONS *`.
async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        ServerError::NotFound.into_response_with_detail(state.config.is_development())
    }
}

async fn serve_path(State(state): State<AppState>, request: Request) -> Response {
    let verbose = state.config.is_development();
    let raw_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if let Err(rejection) = state.guard.check(&raw_path) {
        let client = client_addr(&request)
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::warn!(
            client_ip = %client,
            path = %raw_path,
            reason = rejection.reason(),
            "Rejected request path"
        );
        metrics::record_rejection(rejection.reason());
        return ServerError::from(rejection).into_response_with_detail(verbose);
    }

    let path = request.uri().path().to_string();
    match state.policy.content_type_override(&path) {
        Some(content_type) => match serve_document(&state.config, &path, content_type).await {
            Ok(response) => response,
            Err(err) => err.into_response_with_detail(verbose),
        },
        None => serve_static(state.files.clone(), request, verbose).await,
    }
}

/// Read an HTML document (or the default document for `/`) from the content
/// root.
async fn serve_document(
    config: &ServerConfig,
    path: &str,
    content_type: &'static str,
) -> Result<Response, ServerError> {
    let relative = if path == "/" {
        config.content.default_document.clone()
    } else {
        urlencoding::decode(path)
            .map_err(|_| ServerError::NotFound)?
            .into_owned()
    };

    let file = resolve_under(&config.content.root_dir, &relative).ok_or(ServerError::NotFound)?;
    let body = tokio::fs::read(&file).await?;

    let mut response = Body::from(body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok(response)
}

/// Everything that is not HTML goes through the generic file service.
async fn serve_static(files: ServeDir, request: Request, verbose: bool) -> Response {
    match files.oneshot(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            ServerError::NotFound.into_response_with_detail(verbose)
        }
        Ok(response) => response.map(Body::new),
        Err(err) => ServerError::Internal(err.to_string()).into_response_with_detail(verbose),
    }
}

/// Join a request path onto `root`, refusing anything but plain names.
pub fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => resolved.push(name),
            _ => return None,
        }
    }
    if resolved == root {
        return None;
    }
    Some(resolved)
}

fn client_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[tokio::test(start_paused = true)]
    async fn timed_out_requests_keep_policy_headers() {
        let mut config = ServerConfig::default();
        config.mode = Mode::Production;
        config.cors.allowed_origins = vec!["https://a.example.com".to_string()];
        config.timeouts.request_secs = 1;

        let routes = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                StatusCode::OK
            }),
        );
        let router = with_layers(routes, AppState::new(config));

        let request = axum::http::Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example.com");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key(X_REQUEST_ID));
    }

    #[test]
    fn resolves_plain_names() {
        let root = Path::new("/srv/www");
        assert_eq!(
            resolve_under(root, "/retell-seamless.html"),
            Some(PathBuf::from("/srv/www/retell-seamless.html"))
        );
        assert_eq!(
            resolve_under(root, "//pages/./chat.html"),
            Some(PathBuf::from("/srv/www/pages/chat.html"))
        );
    }

    #[test]
    fn refuses_escaping_paths() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_under(root, "/../etc/passwd"), None);
        assert_eq!(resolve_under(root, "/"), None);
        assert_eq!(resolve_under(root, ""), None);
    }
}
