//! Application settings loaded from `cafe.toml` and the environment.
//!
//! Every field has a default, so the client runs without a config file. Environment
//! variables win over the file: `CAFE_API_URL` sets the backend base URL and
//! `DATABASE_URL` the local state database.

use crate::config::database;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "cafe.toml";

/// Top-level configuration of the client.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the REST backend, without trailing slash
    pub api_base_url: String,
    /// Connection URL for the local state database
    pub database_url: String,
    /// Timeout applied to every HTTP request
    pub request_timeout_secs: u64,
    /// Refresh period of the admin order list
    pub order_poll_interval_ms: u64,
    /// Refresh period of the admin dashboard stats
    pub stats_poll_interval_ms: u64,
    /// Table identifiers that may be used for in-venue ordering
    pub tables: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            database_url: database::DEFAULT_DATABASE_URL.to_string(),
            request_timeout_secs: 30,
            order_poll_interval_ms: 2000,
            stats_poll_interval_ms: 5000,
            tables: (1..=10).map(|n| n.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Order list polling period as a [`Duration`].
    #[must_use]
    pub const fn order_poll_interval(&self) -> Duration {
        Duration::from_millis(self.order_poll_interval_ms)
    }

    /// Dashboard stats polling period as a [`Duration`].
    #[must_use]
    pub const fn stats_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stats_poll_interval_ms)
    }

    fn validate(mut self) -> Result<Self> {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        if self.api_base_url.is_empty() {
            return Err(Error::Config {
                message: "api_base_url cannot be empty".to_string(),
            });
        }
        if self.tables.is_empty() {
            return Err(Error::Config {
                message: "at least one table must be configured".to_string(),
            });
        }
        if self.order_poll_interval_ms == 0 || self.stats_poll_interval_ms == 0 {
            return Err(Error::Config {
                message: "poll intervals must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse cafe.toml: {e}"),
    })?;
    config.validate()
}

/// Loads configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads the configuration used by the binary.
///
/// Reads the file named by `CAFE_CONFIG` (default `cafe.toml`) when it exists, then applies
/// the `CAFE_API_URL` and `DATABASE_URL` overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CAFE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        warn!("Config file {} not found, using defaults", path);
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("CAFE_API_URL") {
        config.api_base_url = url;
    }
    if std::env::var("DATABASE_URL").is_ok() {
        config.database_url = database::get_database_url();
    }

    let config = config.validate()?;
    info!(
        "Using API at {} with {} tables",
        config.api_base_url,
        config.tables.len()
    );
    Ok(config)
}
