//! Configuration types for newsstore

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::{Error, Result};

/// Storage configuration
///
/// Every field has a serde default, so an empty JSON/TOML table is a valid
/// configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path (default: "newsstore.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Maximum pooled SQLite connections (default: 8)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long SQLite waits on a locked database before reporting busy
    /// (default: 5 seconds)
    #[serde(default = "default_busy_timeout", with = "duration_serde")]
    pub busy_timeout: Duration,

    /// Retry policy for saves that hit a busy database
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout: default_busy_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Configuration for a database at `path` with default settings
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Default::default()
        }
    }

    /// Reject settings the pool cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::Config {
                message: "max_connections must be at least 1".into(),
                key: Some("max_connections".into()),
            });
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be a finite number >= 1.0".into(),
                key: Some("retry.backoff_multiplier".into()),
            });
        }
        Ok(())
    }
}

/// Retry configuration for transient (busy/locked) failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 10 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 1 second)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("newsstore.db")
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(10)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Durations are written as whole milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
