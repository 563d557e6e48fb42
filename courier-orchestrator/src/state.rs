//! Shared application state handed to every handler

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::queue::QueueRegistry;
use crate::storage::FileSystemStorage;

/// Dispatch tuning
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Upper bound on a long-poll window
    pub long_poll_timeout: Duration,
    /// Delay before a failed execution is re-enqueued
    pub retry_backoff: Duration,
    pub max_retries: u32,
    /// Sleep between dequeue attempts while long-polling
    pub check_poll_interval: Duration,
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            long_poll_timeout: config.long_poll_timeout,
            retry_backoff: config.retry_backoff,
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            long_poll_timeout: Duration::from_secs(600),
            retry_backoff: Duration::from_secs(3),
            max_retries: 3,
            check_poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub queues: Arc<QueueRegistry>,
    pub storage: Arc<FileSystemStorage>,
    pub settings: Arc<DispatchSettings>,
    /// Cancelled on server shutdown; ends pending long-polls
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        queues: QueueRegistry,
        storage: FileSystemStorage,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            pool,
            queues: Arc::new(queues),
            storage: Arc::new(storage),
            settings: Arc::new(settings),
            shutdown: CancellationToken::new(),
        }
    }
}
