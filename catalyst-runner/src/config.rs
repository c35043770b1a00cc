//! Scan configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard setup: `catalyst_database.csv`, top 10, one-hour price cache,
//! five-second lookup deadline, ten price workers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on concurrent price lookups.
pub const MAX_PRICE_WORKERS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub dataset: DatasetConfig,
    pub scan: ScanSettings,
    pub prices: PriceSettings,
}

/// Where the catalyst dataset lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalyst_database.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// Number of upcoming catalysts to price and flag.
    pub top_n: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

/// Price lookup tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PriceSettings {
    pub cache_ttl_secs: u64,
    pub lookup_timeout_secs: u64,
    pub max_workers: usize,
    pub max_retries: u32,
    pub breaker_cooldown_secs: u64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            lookup_timeout_secs: 5,
            max_workers: MAX_PRICE_WORKERS,
            max_retries: 2,
            breaker_cooldown_secs: 30 * 60,
        }
    }
}

impl PriceSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// HTTP timeout for one request: the lookup deadline split across the first
    /// attempt and every retry, so retries still fit when requests hang.
    pub fn request_timeout(&self) -> Duration {
        self.lookup_timeout() / (self.max_retries.saturating_add(1))
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

impl ScanConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.top_n == 0 {
            return Err(ConfigError::Invalid("scan.top_n must be at least 1".into()));
        }
        if self.prices.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("prices.cache_ttl_secs must be at least 1".into()));
        }
        if self.prices.lookup_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "prices.lookup_timeout_secs must be at least 1".into(),
            ));
        }
        if !(1..=MAX_PRICE_WORKERS).contains(&self.prices.max_workers) {
            return Err(ConfigError::Invalid(format!(
                "prices.max_workers must be between 1 and {MAX_PRICE_WORKERS}"
            )));
        }
        Ok(())
    }
}
