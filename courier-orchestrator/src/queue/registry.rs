use courier_core::domain::instance::Instance;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{DurableQueue, QueueError};

/// Lazily opened queues, one per instance
///
/// Constructed once at startup and shared through the application state.
#[derive(Debug)]
pub struct QueueRegistry {
    root: PathBuf,
    queues: Mutex<HashMap<Instance, Arc<DurableQueue>>>,
}

impl QueueRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queues: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the queue of `instance`, opening it on first use
    pub async fn ensure(&self, instance: &Instance) -> Result<Arc<DurableQueue>, QueueError> {
        let mut queues = self.queues.lock().await;

        if let Some(queue) = queues.get(instance) {
            return Ok(Arc::clone(queue));
        }

        let queue = Arc::new(DurableQueue::open(&self.root, instance).await?);
        queues.insert(instance.clone(), Arc::clone(&queue));

        tracing::info!("Queue registered for {}", instance);
        Ok(queue)
    }
}
