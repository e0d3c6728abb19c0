// Process configuration
// Everything is read from environment variables; only malformed values are errors

use crate::catalog::{CatalogConfig, DEFAULT_CMS_BASE_URL, DEFAULT_COLLECTION};
use crate::server::DEFAULT_SESSION_IDLE;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
    pub session_idle: Duration,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank variables are treated as unset
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_addr = var("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "LISTEN_ADDR",
                reason: e.to_string(),
            })?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        let timeout_ms = var("CATALOG_TIMEOUT_MS")
            .map(|v| {
                v.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: "CATALOG_TIMEOUT_MS",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let session_idle = var("SESSION_IDLE_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::InvalidValue {
                        name: "SESSION_IDLE_SECS",
                        reason: e.to_string(),
                    })
            })
            .transpose()?
            .unwrap_or(DEFAULT_SESSION_IDLE);

        let catalog = CatalogConfig {
            base_url: var("WEBFLOW_API_BASE_URL").unwrap_or_else(|| DEFAULT_CMS_BASE_URL.to_string()),
            site_id: var("WEBFLOW_SITE_ID"),
            api_token: var("WEBFLOW_API_TOKEN"),
            collection: var("WEBFLOW_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            timeout_ms,
        };

        Ok(Self {
            listen_addr,
            log_format,
            session_idle,
            catalog,
        })
    }
}
