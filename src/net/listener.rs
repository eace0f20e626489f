//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve the configured host and port
//! - Bind the socket the HTTP server accepts on
//! - Report bind failures as a distinct, fatal error

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{lookup_host, TcpListener};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name did not resolve to any address.
    #[error("Failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.address();
    let resolved = resolve(&address).await?;

    let listener = TcpListener::bind(resolved)
        .await
        .map_err(|source| ListenerError::Bind { address: resolved, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { address: resolved, source })?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

async fn resolve(address: &str) -> Result<SocketAddr, ListenerError> {
    let mut addrs = lookup_host(address).await.map_err(|source| ListenerError::Resolve {
        address: address.to_string(),
        source,
    })?;

    addrs.next().ok_or_else(|| ListenerError::Resolve {
        address: address.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let config = ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let first = bind(&ListenerConfig { host: "127.0.0.1".into(), port: 0 }).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let err = bind(&ListenerConfig { host: "127.0.0.1".into(), port }).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }
}
