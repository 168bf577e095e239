//! Configuration loading and management.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. First config file found: `--config`, `$FORMFLOW_CONFIG_PATH`,
//!    `./formflow/config.yaml`, `~/.formflow/config.yaml`
//! 3. Environment variables (`FORMFLOW_*`)
//! 4. CLI flags (applied by the binary)

use crate::api::ClientConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default FormFlow API base URL.
pub const DEFAULT_API_URL: &str = "https://www.form-flow.xyz";

/// Tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

/// Local storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".formflow/formflow.db")
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the FormFlow API.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Credential token. Usually supplied per import instead.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Deadline for data fetches in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Deadline for the connection test in seconds.
    #[serde(default = "default_test_timeout")]
    pub test_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            token: None,
            fetch_timeout_seconds: default_fetch_timeout(),
            test_timeout_seconds: default_test_timeout(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_test_timeout() -> u64 {
    10
}

impl ApiConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_seconds)
    }

    /// Client settings for the given credential and base URL.
    pub fn client_config(&self, api_token: &str, base_url: &str) -> ClientConfig {
        ClientConfig::new(base_url, api_token)
            .with_timeouts(self.fetch_timeout(), self.test_timeout())
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Candidate config files in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var("FORMFLOW_CONFIG_PATH") {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("formflow/config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".formflow").join("config.yaml"));
        }
        paths
    }

    /// Load from an explicit path, or the first existing search path, or defaults.
    /// Environment overrides are applied on top.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "Loading config");
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `FORMFLOW_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(db_path) = std::env::var("FORMFLOW_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }

        if let Ok(url) = std::env::var("FORMFLOW_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(token) = std::env::var("FORMFLOW_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Ok(timeout) = std::env::var("FORMFLOW_FETCH_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.api.fetch_timeout_seconds = timeout;
            }
        }

        if let Ok(timeout) = std::env::var("FORMFLOW_TEST_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.api.test_timeout_seconds = timeout;
            }
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.storage.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
