//! Configuration loading and management for propsum.
//!
//! Loads settings from `propsum.toml` with environment variable overrides for
//! the inference endpoint and model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Ollama inference server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Server base URL, without the `/api/generate` path
    pub base_url: String,
    /// Model identifier (e.g., "gemma2:2b")
    pub model: String,
    /// Seconds allowed for connecting and for each wait between reads.
    /// A streamed reply may take longer than this in total.
    pub timeout_secs: u64,
    /// Explicit `stream` flag for the request body. Left out when unset,
    /// in which case the server streams NDJSON.
    pub stream: Option<bool>,
}

/// Retry settings for a single inference call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub delay_ms: u64,
}

/// Batch pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause after every fully processed property
    pub throttle_ms: u64,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location (propsum.toml in cwd or home).
    ///
    /// Falls back to the built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.ollama.base_url = host;
        }
        if let Ok(model) = std::env::var("PROPSUM_MODEL") {
            self.ollama.model = model;
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("propsum.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("propsum")
            .join("propsum.toml");
        home_config.exists().then_some(home_config)
    }

    /// Full URL of the generate endpoint
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.ollama.base_url.trim_end_matches('/'))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.batch.throttle_ms)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma2:2b".to_string(),
            timeout_secs: 30,
            stream: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { throttle_ms: 500 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
        }
    }
}
