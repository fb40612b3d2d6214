//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the valuation API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Dataset path used when neither a path nor a URL is configured.
pub const DEFAULT_DATASET_PATH: &str = "data/london_boroughs.csv";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the address lookup service.
    pub address_base_url: String,
    /// Base URL of the valuation service.
    pub valuation_base_url: String,
    /// Name of the env var holding the valuation API key, if any.
    #[serde(default)]
    pub valuation_api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MarketDataConfig {
    /// Local dataset file. Takes precedence over `dataset_url`.
    #[serde(default)]
    pub dataset_path: Option<String>,
    #[serde(default)]
    pub dataset_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Where the borough dataset should be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    File(String),
    Url(String),
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The valuation API key, if one is configured and set.
    pub fn valuation_api_key(&self) -> Option<String> {
        self.valuation_api_key_env
            .as_deref()
            .and_then(|env| AppConfig::resolve_env(env).ok())
            .filter(|key| !key.is_empty())
    }
}

impl MarketDataConfig {
    pub fn location(&self) -> DatasetLocation {
        match (&self.dataset_path, &self.dataset_url) {
            (Some(path), _) => DatasetLocation::File(path.clone()),
            (None, Some(url)) => DatasetLocation::Url(url.clone()),
            (None, None) => DatasetLocation::File(DEFAULT_DATASET_PATH.to_string()),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
