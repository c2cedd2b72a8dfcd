use std::sync::Arc;

use manual_index::{QueryService, SearchError, ServiceConfig};
use thiserror::Error;

/// Errors raised while assembling configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error(transparent)]
    Service(#[from] SearchError),
}

/// HTTP-layer settings plus the retrieval core configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address, e.g. "127.0.0.1:8081".
    pub address: String,
    /// Upper bound for request bodies (multipart uploads included).
    pub max_upload_bytes: usize,
    pub service: ServiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8081".into(),
            max_upload_bytes: 20 * 1024 * 1024,
            service: ServiceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `API_ADDRESS` and `MAX_UPLOAD_BYTES` are read here; everything else is
    /// delegated to [`ServiceConfig::from_lookup`]. Empty values count as
    /// unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let address = get("API_ADDRESS").unwrap_or(d.address);

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                value: v.clone(),
            })?,
            None => d.max_upload_bytes,
        };

        Ok(Self {
            address,
            max_upload_bytes,
            service: ServiceConfig::from_lookup(&lookup)?,
        })
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: Arc<QueryService>, config: AppConfig) -> Self {
        Self { service, config }
    }
}
