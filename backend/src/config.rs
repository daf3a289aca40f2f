//! Explorer configuration.
//!
//! Settings come from an optional `explorer.toml` and are then overridden by
//! environment variables:
//!
//! - `API_URL`: base URL of the analysis service
//! - `BACKEND_TYPE`: `http` | `local`
//! - `CLOUD_COVER`: maximum scene cloud cover in percent (default 20)
//! - `REQUEST_TIMEOUT_SECS`: per-request timeout; unset means none
//! - `DATA_DIR`: directory holding the persisted key-value store
//! - `HOST` / `PORT`: HTTP bind address of the server binary

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::remote::BackendType;

pub const DEFAULT_CLOUD_COVER: u8 = 20;
pub const CONFIG_FILE_NAME: &str = "explorer.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub api_url: String,
    pub backend_type: BackendType,
    pub cloud_cover: u8,
    pub request_timeout_secs: Option<u64>,
    pub data_dir: PathBuf,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            backend_type: BackendType::Http,
            cloud_cover: DEFAULT_CLOUD_COVER,
            request_timeout_secs: None,
            data_dir: PathBuf::from("data"),
            server: ServerSettings::default(),
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ExplorerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Find `explorer.toml` in the usual places.
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Defaults, then the config file if one exists, then the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match Self::find_default_file() {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn apply_env(&mut self) -> Result<(), String> {
        if let Ok(url) = env::var("API_URL") {
            self.api_url = url;
        }
        if let Ok(kind) = env::var("BACKEND_TYPE") {
            self.backend_type = kind.parse()?;
        }
        if let Ok(cover) = env::var("CLOUD_COVER") {
            self.cloud_cover = cover
                .trim()
                .parse()
                .map_err(|_| "CLOUD_COVER must be an integer between 0 and 100".to_string())?;
        }
        if let Ok(secs) = env::var("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| "REQUEST_TIMEOUT_SECS must be a whole number of seconds".to_string())?;
            self.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Ok(dir) = env::var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| "PORT must be a valid port number".to_string())?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cloud_cover > 100 {
            return Err(format!(
                "cloud_cover must be between 0 and 100 (got {})",
                self.cloud_cover
            ));
        }
        if self.backend_type == BackendType::Http && self.api_url.trim().is_empty() {
            return Err("api_url is required for the http backend".to_string());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
api_url = "https://biomass.example.org"
cloud_cover = 35

[server]
port = 9000
"#;
        let config: ExplorerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_url, "https://biomass.example.org");
        assert_eq!(config.cloud_cover, 35);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backend_type, BackendType::Http);
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_parse_backend_type() {
        let config: ExplorerConfig = toml::from_str("backend_type = \"local\"").unwrap();
        assert_eq!(config.backend_type, BackendType::Local);
    }

    #[test]
    fn test_validate_cloud_cover() {
        let config = ExplorerConfig {
            cloud_cover: 120,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ExplorerConfig::default().validate().is_ok());
    }
}
