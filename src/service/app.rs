//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the booking
//! core, authentication, metrics and the HTTP server together and owns the
//! background tasks.

use crate::api::server::{ApiServer, ApiServerConfig};
use crate::auth::{AccountDirectory, AuthError, IdentityResolver};
use crate::config::AppConfig;
use crate::lifecycle::BookingService;
use crate::metrics::MetricsCollector;
use crate::store::{BookingStore, InMemoryBookingStore};
use crate::types::Identity;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Core booking lifecycle service
    booking_service: BookingService,

    /// Login accounts and issued sessions
    accounts: Arc<AccountDirectory>,

    /// Resolves bearer tokens to identities
    identity_resolver: Arc<dyn IdentityResolver>,

    /// Metrics collector shared with the booking service
    metrics_collector: Arc<MetricsCollector>,

    /// HTTP server for the booking API and health endpoints
    api_server: Arc<ApiServer>,

    /// Background task handles, by name
    background_tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with an in-memory store and the
    /// configured accounts as the identity source
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} booking service", config.service.name);

        let store: Arc<dyn BookingStore> = Arc::new(InMemoryBookingStore::new());
        let accounts = Arc::new(
            AccountDirectory::new(&config.auth.accounts).with_session_ttl(config.session_ttl()),
        );
        let resolver: Arc<dyn IdentityResolver> = accounts.clone();

        Self::with_components(config, store, accounts, resolver)
    }

    /// Initialize the application around explicit components
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn BookingStore>,
        accounts: Arc<AccountDirectory>,
        identity_resolver: Arc<dyn IdentityResolver>,
    ) -> Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let booking_service = BookingService::with_metrics(store, metrics_collector.clone());

        let api_server = Arc::new(ApiServer::new(ApiServerConfig {
            host: config.service.http_host.clone(),
            port: config.service.http_port,
        }));

        info!(
            "Components ready - accounts: {}, http: {}",
            accounts.account_count(),
            config.http_addr()
        );

        Ok(Self {
            config,
            booking_service,
            accounts,
            identity_resolver,
            metrics_collector,
            api_server,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting {} booking service", self.config.service.name);

        *self.is_running.write().await = true;

        let server_task = {
            let api_server = self.api_server.clone();
            let app_state = self.clone();
            tokio::spawn(async move {
                if let Err(e) = api_server.start(app_state).await {
                    error!("HTTP server failed: {}", e);
                } else {
                    info!("HTTP server task completed");
                }
            })
        };

        let stats_task = self.spawn_stats_task();

        let mut tasks = self.background_tasks.lock().await;
        tasks.push(("http_server", server_task));
        tasks.push(("stats_refresh", stats_task));

        info!("✅ Booking service started on http://{}", self.config.http_addr());
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of booking service");

        *self.is_running.write().await = false;

        if let Err(e) = self.api_server.stop().await {
            warn!("Failed to stop HTTP server: {}", e);
        }

        let tasks: Vec<_> = self.background_tasks.lock().await.drain(..).collect();
        let task_count = tasks.len();
        let timeout = self.config.shutdown_timeout();

        for (name, task) in tasks {
            if name != "http_server" {
                // Periodic tasks only hold derived state
                task.abort();
                continue;
            }

            let abort = task.abort_handle();
            if tokio::time::timeout(timeout, task).await.is_err() {
                warn!("Task '{}' did not stop within {:?}, aborting", name, timeout);
                abort.abort();
            }
        }
        debug!("{} background tasks stopped", task_count);

        let final_count =
            self.booking_service
                .booking_count()
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to read final booking count: {}", e),
                })?;

        info!("Final booking count: {}", final_count);
        info!("✅ Booking service shutdown completed");
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Mark the service as running without starting the HTTP server
    pub async fn mark_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }

    /// Get the booking lifecycle service
    pub fn booking_service(&self) -> &BookingService {
        &self.booking_service
    }

    /// Get the account directory
    pub fn accounts(&self) -> Arc<AccountDirectory> {
        self.accounts.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Seconds since the state was created
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Resolve a bearer token; `Ok(None)` for unknown or expired tokens
    pub async fn resolve_identity(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        self.identity_resolver.resolve(token).await.map_err(|e| {
            error!("Identity resolution failed: {}", e);
            e
        })
    }

    fn spawn_stats_task(&self) -> JoinHandle<()> {
        let booking_service = self.booking_service.clone();
        let accounts = self.accounts.clone();
        let metrics_collector = self.metrics_collector.clone();
        let is_running = self.is_running.clone();
        let interval_duration = self.config.stats_interval();
        let started_at = self.started_at;

        info!(
            "Starting stats refresh task ({}s interval)...",
            interval_duration.as_secs()
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);

            while *is_running.read().await {
                interval.tick().await;

                metrics_collector
                    .service()
                    .uptime_seconds
                    .set(started_at.elapsed().as_secs() as i64);

                match booking_service.booking_count() {
                    Ok(count) => {
                        debug!("Refreshing stats - bookings: {}", count);
                        metrics_collector.update_booking_count(count);
                        metrics_collector.update_component_health("booking_store", true);
                        metrics_collector.update_health_status(2);
                    }
                    Err(e) => {
                        warn!("Failed to read booking count: {}", e);
                        metrics_collector.update_component_health("booking_store", false);
                        metrics_collector.update_health_status(0);
                    }
                }

                if let Err(e) = accounts.prune_expired() {
                    warn!("Failed to prune expired sessions: {}", e);
                }
            }

            info!("Stats refresh task stopped");
        })
    }
}
