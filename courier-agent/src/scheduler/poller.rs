//! Execution poller
//!
//! Long-polls the orchestrator for every configured instance and runs
//! each dispatched execution in its own supervised task. Every instance is
//! checked each cycle; the parallel-execution limit only gates starting
//! pipelines. The poll loop never waits for a pipeline to finish.

use courier_core::domain::instance::Instance;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::repository::ExecutionRepository;
use crate::service::{CommandRunner, LogShipper, StepExecutor};

/// Execution poller that continuously checks the instance queues
pub struct ExecutionPoller {
    config: Config,
    repository: Arc<dyn ExecutionRepository>,
    executor: Arc<StepExecutor>,
    shipper: LogShipper,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ExecutionPoller {
    pub fn new(
        config: Config,
        repository: Arc<dyn ExecutionRepository>,
        executor: Arc<StepExecutor>,
        shipper: LogShipper,
        cancel: CancellationToken,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_executions));
        Self {
            config,
            repository,
            executor,
            shipper,
            semaphore,
            cancel,
        }
    }

    /// Wires the log shipper and step executor from the configuration
    ///
    /// The shipper's consumer stops with `cancel`.
    pub fn start(
        config: Config,
        repository: Arc<dyn ExecutionRepository>,
        runner: Arc<dyn CommandRunner>,
        cancel: CancellationToken,
    ) -> Self {
        let (shipper, _consumer) = LogShipper::start(
            repository.clone(),
            config.agent_name.clone(),
            config.log_ship_interval,
            cancel.clone(),
        );

        let executor = Arc::new(StepExecutor::new(
            repository.clone(),
            runner,
            shipper.clone(),
            config.toolchain.clone(),
            config.default_folder.clone(),
        ));

        Self::new(config, repository, executor, shipper, cancel)
    }

    /// Runs poll cycles until the cancellation token fires
    pub async fn run(&self) {
        info!(
            "Starting execution poller for {} instance(s) (interval: {:?})",
            self.config.instances.len(),
            self.config.poll_interval
        );

        while !self.cancel.is_cancelled() {
            let dispatched = self.poll_once().await;
            if dispatched > 0 {
                info!("Dispatched {} execution(s) this cycle", dispatched);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("Execution poller stopped");
    }

    /// Checks every instance once; returns how many executions were started
    pub async fn poll_once(&self) -> usize {
        let tasks = self.config.instances.iter().cloned().map(|instance| {
            tokio::spawn(poll_instance(
                instance,
                self.repository.clone(),
                self.executor.clone(),
                self.shipper.clone(),
                self.semaphore.clone(),
                self.config.check_timeout,
                self.cancel.clone(),
            ))
        });

        join_all(tasks)
            .await
            .into_iter()
            .filter(|started| matches!(started, Ok(true)))
            .count()
    }
}

async fn poll_instance(
    instance: Instance,
    repository: Arc<dyn ExecutionRepository>,
    executor: Arc<StepExecutor>,
    shipper: LogShipper,
    semaphore: Arc<Semaphore>,
    check_timeout: Duration,
    cancel: CancellationToken,
) -> bool {
    let checked = tokio::select! {
        _ = cancel.cancelled() => return false,
        checked = repository.check(&instance, check_timeout) => checked,
    };

    let execution_id = match checked {
        Ok(Some(execution_id)) => execution_id,
        Ok(None) => {
            debug!("No executions for {}", instance);
            return false;
        }
        Err(e) => {
            warn!("Failed to check {}: {}", instance, e);
            return false;
        }
    };

    info!("Received execution {} for {}", execution_id, instance);

    // Already dequeued, so wait for a slot instead of skipping
    if semaphore.available_permits() == 0 {
        debug!(
            "Max parallel executions reached, execution {} waits for a slot",
            execution_id
        );
    }
    let permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            error!("Cannot start execution {}: {}", execution_id, e);
            shipper.log_error(execution_id, &anyhow::anyhow!("No execution slot available: {}", e));
            return false;
        }
    };

    spawn_supervised(executor, shipper, instance, execution_id, permit);
    true
}

/// Spawns the pipeline and a supervisor that reports it if it never finishes
///
/// The permit is released once the pipeline task has ended.
fn spawn_supervised(
    executor: Arc<StepExecutor>,
    shipper: LogShipper,
    instance: Instance,
    execution_id: i64,
    permit: OwnedSemaphorePermit,
) {
    let pipeline = tokio::spawn(async move { executor.run(&instance, execution_id).await });

    tokio::spawn(async move {
        let _permit = permit;

        if let Err(e) = pipeline.await {
            error!("Execution {} task ended abnormally: {}", execution_id, e);
            let error = anyhow::anyhow!("Execution task ended abnormally: {}", e);
            shipper.log_error(execution_id, &error);
        }
    });
}
