use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_SERVICE_URL};
use crate::progress::DEFAULT_BAR_WIDTH;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "GENEAGRAPHER_CONFIG";

/// Environment variable overriding `service.url`
pub const SERVICE_URL_ENV: &str = "GENEAGRAPHER_SERVICE_URL";

const DEFAULT_CONFIG_FILE: &str = "geneagrapher.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Graph-building service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_url")]
    pub url: String,
    /// Zero waits indefinitely.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Longest silence tolerated between two service messages. Zero waits indefinitely.
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            receive_timeout_secs: default_receive_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        secs_or_unbounded(self.connect_timeout_secs)
    }

    pub fn receive_timeout(&self) -> Option<Duration> {
        secs_or_unbounded(self.receive_timeout_secs)
    }
}

fn secs_or_unbounded(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Progress bar settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_receive_timeout_secs() -> u64 {
    DEFAULT_RECEIVE_TIMEOUT.as_secs()
}

fn default_bar_width() -> usize {
    DEFAULT_BAR_WIDTH
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in GENEAGRAPHER_CONFIG environment variable (must exist)
    /// 2. ./geneagrapher.toml in current directory (optional)
    ///
    /// GENEAGRAPHER_SERVICE_URL, when set, replaces `service.url`.
    pub fn load() -> Result<Self> {
        // Missing .env is fine
        let _ = dotenv::dotenv();

        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(PathBuf::from(path))?,
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            config.service.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self> {
        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service.url)
            .with_context(|| format!("service.url is not a valid URL: {}", self.service.url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            anyhow::bail!(
                "service.url must use the ws or wss scheme, got {}",
                url.scheme()
            );
        }

        if self.progress.bar_width == 0 {
            anyhow::bail!("progress.bar_width must be greater than 0");
        }

        Ok(())
    }
}
