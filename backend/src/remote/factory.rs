//! Backend factory: picks the remote implementation from configuration.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use super::backend::ExplorerBackend;
use super::error::RemoteResult;
use super::http::HttpBackend;
use super::local::LocalBackend;
use crate::config::ExplorerConfig;

/// Which analysis service implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Remote service over HTTP
    #[default]
    Http,
    /// In-memory synthetic service
    Local,
}

impl FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "remote" => Ok(Self::Http),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown backend type: {}", s)),
        }
    }
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Http => "http",
            BackendType::Local => "local",
        }
    }
}

pub struct BackendFactory;

impl BackendFactory {
    /// Create the backend selected by `config.backend_type`.
    pub fn create(config: &ExplorerConfig) -> RemoteResult<Arc<dyn ExplorerBackend>> {
        match config.backend_type {
            BackendType::Http => {
                let timeout = config.request_timeout_secs.map(Duration::from_secs);
                let backend = HttpBackend::new(&config.api_url, timeout)?;
                info!(
                    "Using HTTP analysis service at {} (timeout: {})",
                    backend.base_url(),
                    timeout.map_or("none".to_string(), |t| format!("{}s", t.as_secs()))
                );
                Ok(Arc::new(backend))
            }
            BackendType::Local => Ok(Self::create_local()),
        }
    }

    pub fn create_local() -> Arc<dyn ExplorerBackend> {
        info!("Using local in-memory analysis service");
        Arc::new(LocalBackend::new())
    }
}
