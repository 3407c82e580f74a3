//! Configuration management for hubstats
//!
//! This module handles loading and validating configuration from TOML files
//! and environment variables. Every section has defaults, so a config file
//! only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::EntityKind;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot locations
    pub sources: SourcesConfig,

    /// Snapshot fetching
    pub fetch: FetchConfig,

    /// Dashboard API server
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Locations of the three snapshot tables
///
/// Each value is an `http(s)://` URI, a `file://` URI or a plain path.
/// Defaults are the published hub-stats parquet conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub models: String,
    pub datasets: String,
    pub spaces: String,
}

/// Snapshot fetch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// Dashboard API server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,

    /// Enable CORS for API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            models: hub_stats_uri("models"),
            datasets: hub_stats_uri("datasets"),
            spaces: hub_stats_uri("spaces"),
        }
    }
}

const HUB_STATS_BASE: &str =
    "https://huggingface.co/datasets/cfahlgren1/hub-stats/resolve/refs%2Fconvert%2Fparquet";

fn hub_stats_uri(relation: &str) -> String {
    format!("{HUB_STATS_BASE}/{relation}/train/0000.parquet?download=true")
}

impl SourcesConfig {
    /// Location configured for one entity kind
    pub fn location(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Model => &self.models,
            EntityKind::Dataset => &self.datasets,
            EntityKind::Space => &self.spaces,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            user_agent: format!("hubstats/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1:8080"),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&content).map_err(|e| {
            Error::config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Apply `HUBSTATS_*` overrides from `lookup`
    ///
    /// An unparseable numeric value is a config error.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HUBSTATS_MODELS_URI") {
            self.sources.models = v;
        }
        if let Some(v) = lookup("HUBSTATS_DATASETS_URI") {
            self.sources.datasets = v;
        }
        if let Some(v) = lookup("HUBSTATS_SPACES_URI") {
            self.sources.spaces = v;
        }
        if let Some(v) = lookup("HUBSTATS_REQUEST_TIMEOUT") {
            self.fetch.request_timeout_secs = v.trim().parse().map_err(|_| {
                Error::config(format!(
                    "HUBSTATS_REQUEST_TIMEOUT must be a whole number of seconds, got '{v}'"
                ))
            })?;
        }
        if let Some(v) = lookup("HUBSTATS_USER_AGENT") {
            self.fetch.user_agent = v;
        }
        if let Some(v) = lookup("HUBSTATS_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = lookup("HUBSTATS_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("HUBSTATS_LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for kind in EntityKind::ALL {
            if self.sources.location(kind).trim().is_empty() {
                return Err(Error::config(format!(
                    "sources.{} must not be empty",
                    kind.relation()
                )));
            }
        }

        if self.fetch.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }

        self.bind_address()?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Parsed server bind address
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|_| {
            Error::config(format!(
                "Invalid bind address: {}",
                self.server.bind_address
            ))
        })
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.request_timeout_secs)
    }
}
