//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use uuid::Uuid;
use widget_server::config::{ListenerConfig, Mode, ServerConfig};
use widget_server::{net, HttpServer, Shutdown};

#[allow(dead_code)]
pub const DEFAULT_DOCUMENT: &str = "<html><body>chat widget</body></html>";

/// A throwaway content root, removed on drop.
pub struct ContentRoot {
    pub path: PathBuf,
}

impl ContentRoot {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("widget-server-test-{}", Uuid::new_v4()));
        fs::create_dir_all(path.join("assets")).unwrap();

        write(&path, "retell-seamless.html", DEFAULT_DOCUMENT);
        write(&path, "widget.html", "<html><body>inline widget</body></html>");
        write(&path, "assets/app.js", "console.log('widget');");
        write(&path, "assets/style.css", "body { margin: 0; }");
        write(&path, ".env", "SECRET=1");
        write(&path, "server.py", "print('hi')");

        Self { path }
    }
}

impl Drop for ContentRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn write(root: &Path, name: &str, contents: &str) {
    fs::write(root.join(name), contents).unwrap();
}

/// Configuration serving `root` in the given mode.
pub fn config(mode: Mode, origins: &[&str], root: &ContentRoot) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.mode = mode;
    config.cors.allowed_origins = origins.iter().map(|o| o.to_string()).collect();
    config.content.root_dir = root.path.clone();
    config.listener = ListenerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    config
}

/// Send one request through the router without a socket.
#[allow(dead_code)]
pub async fn send(config: ServerConfig, request: Request<Body>) -> Response {
    use tower::ServiceExt;

    HttpServer::new(config).router().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a live server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: ServerConfig) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = net::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stopped = shutdown.wait();

    let server = HttpServer::new(config);
    let handle = tokio::spawn(async move {
        server.run(listener, stopped).await.unwrap();
    });

    (addr, shutdown, handle)
}
