//! Durable Per-Instance Queues
//!
//! Each instance owns a FIFO of execution ids persisted in its own SQLite
//! file under `<root>/<tenant>/<environment>/queue.db`. Dequeues happen inside
//! a session that must be flushed to commit the removal; a session dropped
//! without a flush rolls back and the id stays at the head.

mod registry;

pub use registry::QueueRegistry;

use courier_core::domain::instance::Instance;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use std::path::{Path, PathBuf};
use thiserror::Error;

const QUEUE_FILE: &str = "queue.db";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid queue name: {0}")]
    InvalidName(String),

    #[error("Queue folder error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Queue store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Crash-durable FIFO of execution ids for one instance
#[derive(Debug)]
pub struct DurableQueue {
    instance: Instance,
    folder: PathBuf,
    pool: SqlitePool,
}

impl DurableQueue {
    /// Opens (creating if needed) the queue of `instance` below `root`
    pub async fn open(root: &Path, instance: &Instance) -> Result<Self, QueueError> {
        validate_segment(instance.tenant())?;
        validate_segment(instance.environment())?;

        let folder = root.join(instance.tenant()).join(instance.environment());
        tokio::fs::create_dir_all(&folder).await?;

        let options = SqliteConnectOptions::new()
            .filename(folder.join(QUEUE_FILE))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        // One connection serialises every session on this queue.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_items (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                execution_id INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::debug!("Opened queue for {} at {}", instance, folder.display());

        Ok(Self {
            instance: instance.clone(),
            folder,
            pool,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Appends an execution id at the tail
    pub async fn enqueue(&self, execution_id: i64) -> Result<(), QueueError> {
        sqlx::query("INSERT INTO queue_items (execution_id) VALUES (?)")
            .bind(execution_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Enqueued execution {} on {}", execution_id, self.instance);
        Ok(())
    }

    /// Removes the head inside a session; `None` when the queue is empty
    pub async fn try_dequeue(&self) -> Result<Option<DequeueSession>, QueueError> {
        let mut tx = self.pool.begin().await?;

        let head: Option<(i64, i64)> =
            sqlx::query_as("SELECT seq, execution_id FROM queue_items ORDER BY seq ASC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let Some((seq, execution_id)) = head else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM queue_items WHERE seq = ?")
            .bind(seq)
            .execute(&mut *tx)
            .await?;

        Ok(Some(DequeueSession { tx, execution_id }))
    }

    /// Number of ids waiting in the queue
    pub async fn len(&self) -> Result<i64, QueueError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    /// Closes the underlying store, waiting for open sessions to end
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Pending removal of the queue head
///
/// Dropping the session without calling [`DequeueSession::flush`] rolls the
/// removal back.
pub struct DequeueSession {
    tx: Transaction<'static, Sqlite>,
    execution_id: i64,
}

impl DequeueSession {
    pub fn execution_id(&self) -> i64 {
        self.execution_id
    }

    /// Commits the removal
    pub async fn flush(self) -> Result<i64, QueueError> {
        self.tx.commit().await?;
        Ok(self.execution_id)
    }
}

/// Rejects names that cannot safely be used as a single directory segment
pub fn validate_segment(value: &str) -> Result<(), QueueError> {
    if value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains('/')
        || value.contains('\\')
    {
        return Err(QueueError::InvalidName(value.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_queue(root: &Path) -> DurableQueue {
        DurableQueue::open(root, &Instance::new("Some", "Prod"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let dir = tempfile::tempdir().unwrap();
        let queue = open_queue(dir.path()).await;

        for id in [3, 1, 2] {
            queue.enqueue(id).await.unwrap();
        }

        let mut seen = Vec::new();
        while let Some(session) = queue.try_dequeue().await.unwrap() {
            seen.push(session.flush().await.unwrap());
        }

        assert_eq!(seen, vec![3, 1, 2]);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_queue_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let queue = open_queue(dir.path()).await;

        assert!(queue.try_dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_session_keeps_item_at_head() {
        let dir = tempfile::tempdir().unwrap();
        let queue = open_queue(dir.path()).await;
        queue.enqueue(10).await.unwrap();
        queue.enqueue(11).await.unwrap();

        let session = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(session.execution_id(), 10);
        drop(session);

        let session = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(session.execution_id(), 10);
        session.flush().await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_items_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let queue = open_queue(dir.path()).await;
        queue.enqueue(5).await.unwrap();
        queue.enqueue(6).await.unwrap();
        let session = queue.try_dequeue().await.unwrap().unwrap();
        drop(session);
        queue.close().await;
        drop(queue);

        let queue = open_queue(dir.path()).await;
        assert_eq!(queue.len().await.unwrap(), 2);
        let session = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(session.execution_id(), 5);
    }

    #[tokio::test]
    async fn test_queue_lives_in_instance_folder() {
        let dir = tempfile::tempdir().unwrap();
        let queue = open_queue(dir.path()).await;

        assert_eq!(queue.folder(), dir.path().join("Some").join("Prod"));
        assert!(queue.folder().join(QUEUE_FILE).exists());
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("Prod").is_ok());
        assert!(validate_segment("team-a_1").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_rejects_path_escaping_instance() {
        let dir = tempfile::tempdir().unwrap();
        let result = DurableQueue::open(dir.path(), &Instance::new("..", "Prod")).await;

        assert!(matches!(result, Err(QueueError::InvalidName(_))));
    }
}
