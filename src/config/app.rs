//! Main application configuration
//!
//! This module defines the primary configuration structures for the booking
//! service, including file and environment variable loading and validation.

use crate::types::{Role, SubjectId};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub auth: AuthSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub http_host: String,
    /// Port for the booking API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Interval of the background stats refresh in seconds
    pub stats_interval_seconds: u64,
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Accounts allowed to log in
    pub accounts: Vec<AccountConfig>,
    /// Lifetime of an issued session token in seconds
    pub session_ttl_seconds: u64,
}

/// A configured login account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
    pub subject_id: SubjectId,
    pub role: Role,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "doovo-bookings".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 4000,
            shutdown_timeout_seconds: 30,
            stats_interval_seconds: 30,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        // Demo accounts, one per role
        Self {
            accounts: vec![
                AccountConfig {
                    email: "customer@test.com".to_string(),
                    password: "1234".to_string(),
                    subject_id: "1".to_string(),
                    role: Role::Customer,
                },
                AccountConfig {
                    email: "washer@test.com".to_string(),
                    password: "1234".to_string(),
                    subject_id: "2".to_string(),
                    role: Role::Worker,
                },
            ],
            session_ttl_seconds: 86_400,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing fields take defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        // PORT is what most hosting platforms inject
        if let Ok(port) = env::var("HTTP_PORT").or_else(|_| env::var("PORT")) {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(interval) = env::var("STATS_INTERVAL_SECONDS") {
            self.service.stats_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid STATS_INTERVAL_SECONDS value: {}", interval))?;
        }
        if let Ok(ttl) = env::var("SESSION_TTL_SECONDS") {
            self.auth.session_ttl_seconds = ttl
                .parse()
                .map_err(|_| anyhow!("Invalid SESSION_TTL_SECONDS value: {}", ttl))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get stats refresh interval as Duration
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.service.stats_interval_seconds)
    }

    /// Get session token lifetime as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.session_ttl_seconds)
    }

    /// Address string for the HTTP listener
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.http_host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.stats_interval_seconds == 0 {
        return Err(anyhow!("Stats interval must be greater than 0"));
    }
    if config.auth.session_ttl_seconds == 0 {
        return Err(anyhow!("Session TTL must be greater than 0"));
    }

    // Validate accounts
    let mut emails = HashSet::new();
    let mut subjects = HashSet::new();
    for account in &config.auth.accounts {
        if account.email.is_empty() {
            return Err(anyhow!("Account email cannot be empty"));
        }
        if account.subject_id.is_empty() {
            return Err(anyhow!("Account '{}' has an empty subject id", account.email));
        }
        if !emails.insert(account.email.as_str()) {
            return Err(anyhow!("Duplicate account email: {}", account.email));
        }
        if !subjects.insert(account.subject_id.as_str()) {
            return Err(anyhow!("Duplicate account subject id: {}", account.subject_id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.service.http_port, 4000);
        assert_eq!(config.auth.accounts.len(), 2);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.http_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [service]
            http_port = 8081
            log_level = "debug"

            [[auth.accounts]]
            email = "ops@test.com"
            password = "pw"
            subject_id = "ops"
            role = "washer"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.http_port, 8081);
        assert_eq!(config.service.name, "doovo-bookings");
        assert_eq!(config.auth.accounts.len(), 1);
        assert_eq!(config.auth.accounts[0].role, Role::Worker);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.http_port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.stats_interval_seconds = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.auth.session_ttl_seconds = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        let duplicate = config.auth.accounts[0].clone();
        config.auth.accounts.push(duplicate);
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.auth.accounts[1].subject_id = config.auth.accounts[0].subject_id.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_unknown_role_in_toml_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [[auth.accounts]]
            email = "x@test.com"
            password = "pw"
            subject_id = "x"
            role = "admin"
            "#,
        );
        assert!(result.is_err());
    }
}
