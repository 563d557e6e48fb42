//! Orchestrator configuration
//!
//! Store locations, bind address and dispatch tuning, read from the
//! environment with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Execution store connection string (e.g., "sqlite://courier.db")
    pub database_url: String,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Root folder of the per-instance durable queues
    pub queues_folder: PathBuf,

    /// Root folder of the package blob store
    pub blob_folder: PathBuf,

    /// Upper bound on a single long-poll `check` request
    pub long_poll_timeout: Duration,

    /// Delay before a failed execution is re-enqueued
    pub retry_backoff: Duration,

    /// Number of retries granted before a failure becomes terminal
    pub max_retries: u32,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - DATABASE_URL (default: sqlite://courier.db)
    /// - ORCHESTRATOR_BIND_ADDR (default: 0.0.0.0:8080)
    /// - QUEUES_FOLDER (default: data/queues)
    /// - BLOB_FOLDER (default: data/blobs)
    /// - LONG_POLL_TIMEOUT (seconds, default: 600)
    /// - RETRY_BACKOFF (seconds, default: 3)
    /// - MAX_RETRIES (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: std::env::var("ORCHESTRATOR_BIND_ADDR").unwrap_or(defaults.bind_addr),
            queues_folder: std::env::var("QUEUES_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.queues_folder),
            blob_folder: std::env::var("BLOB_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.blob_folder),
            long_poll_timeout: env_secs("LONG_POLL_TIMEOUT").unwrap_or(defaults.long_poll_timeout),
            retry_backoff: env_secs("RETRY_BACKOFF").unwrap_or(defaults.retry_backoff),
            max_retries: std::env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.max_retries),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!("database_url must be a sqlite: connection string");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.queues_folder.as_os_str().is_empty() {
            anyhow::bail!("queues_folder cannot be empty");
        }

        if self.blob_folder.as_os_str().is_empty() {
            anyhow::bail!("blob_folder cannot be empty");
        }

        if self.long_poll_timeout.is_zero() {
            anyhow::bail!("long_poll_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://courier.db".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            queues_folder: PathBuf::from("data/queues"),
            blob_folder: PathBuf::from("data/blobs"),
            long_poll_timeout: Duration::from_secs(600),
            retry_backoff: Duration::from_secs(3),
            max_retries: 3,
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.long_poll_timeout, Duration::from_secs(600));
        assert_eq!(config.retry_backoff, Duration::from_secs(3));
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.database_url = "postgres://localhost/courier".to_string();
        assert!(config.validate().is_err());

        config.database_url = "sqlite::memory:".to_string();
        assert!(config.validate().is_ok());

        config.long_poll_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
