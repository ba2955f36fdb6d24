//! HTTP server for the booking API
//!
//! Serves the router from [`crate::api::routes`] with graceful shutdown
//! driven by a broadcast channel.

use crate::api::routes::router;
use crate::service::app::AppState;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

impl ApiServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid API server address")
    }
}

/// HTTP server for booking, health and metrics endpoints
pub struct ApiServer {
    config: ApiServerConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &ApiServerConfig {
        &self.config
    }

    /// Bind and serve until [`ApiServer::stop`] is called
    pub async fn start(&self, app_state: Arc<AppState>) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        self.serve(listener, app_state).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener, app_state: Arc<AppState>) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let app = router(app_state);

        info!("API server listening on http://{}", local_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping API server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::time::Duration;

    #[test]
    fn test_api_server_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.socket_addr().is_ok());

        let bad = ApiServerConfig {
            host: "not a host".to_string(),
            port: 4000,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[tokio::test]
    async fn test_serve_stops_on_signal() {
        let app_state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());
        let server = Arc::new(ApiServer::new(ApiServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let task = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener, app_state).await })
        };

        // Let the server subscribe before signalling
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.stop().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
