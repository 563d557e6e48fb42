//! Log shipper
//!
//! Delivers step reports to the orchestrator from a single background
//! consumer. Submitting never blocks: reports are logged locally and queued
//! in memory. Transient delivery failures put the report back at the tail;
//! permanent ones are logged and the report is dropped.

use courier_core::domain::execution::{ExecutionState, StepState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::repository::ExecutionRepository;

/// Step id used for failures outside any step
pub const EXECUTOR_STEP_ID: i32 = 0;

/// One step state on its way to the orchestrator
#[derive(Debug, Clone)]
pub struct StepReport {
    pub execution_id: i64,
    pub step_state: StepState,
    /// Set on the final report of an attempt
    pub result: Option<ExecutionState>,
}

/// Handle for submitting step reports
#[derive(Clone)]
pub struct LogShipper {
    sender: mpsc::UnboundedSender<StepReport>,
    executor: Arc<str>,
}

impl LogShipper {
    /// Starts the delivery consumer; it stops when `cancel` fires
    pub fn start(
        repository: Arc<dyn ExecutionRepository>,
        executor: impl Into<Arc<str>>,
        retry_interval: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let consumer = tokio::spawn(deliver(
            receiver,
            sender.clone(),
            repository,
            retry_interval,
            cancel,
        ));

        let shipper = Self {
            sender,
            executor: executor.into(),
        };

        (shipper, consumer)
    }

    /// Name reported as the executor of every step
    pub fn executor(&self) -> &str {
        &self.executor
    }

    /// Logs a report locally and queues it for delivery
    pub fn submit(&self, report: StepReport) {
        let state = &report.step_state;
        info!(
            execution_id = report.execution_id,
            step_id = state.step_id,
            success = state.success,
            result = ?report.result,
            "Step '{}' reported",
            state.step_name
        );
        for line in &state.log {
            info!(
                execution_id = report.execution_id,
                step_id = state.step_id,
                "{}",
                line
            );
        }

        if self.sender.send(report).is_err() {
            error!("Log shipper stopped; report kept in local log only");
        }
    }

    /// Builds and submits the report of a step
    pub fn log_step(
        &self,
        execution_id: i64,
        step_id: i32,
        step_name: &str,
        success: bool,
        log: Vec<String>,
        result: Option<ExecutionState>,
    ) {
        self.submit(StepReport {
            execution_id,
            step_state: StepState {
                step_id,
                step_name: step_name.to_string(),
                executor: self.executor.to_string(),
                success,
                log,
                reported_at: chrono::Utc::now(),
            },
            result,
        });
    }

    /// Submits a terminal failure for an error outside any step
    pub fn log_error(&self, execution_id: i64, error: &anyhow::Error) {
        let log = error.chain().map(|cause| cause.to_string()).collect();

        self.log_step(
            execution_id,
            EXECUTOR_STEP_ID,
            "Failed to execute",
            false,
            log,
            Some(ExecutionState::Failed),
        );
    }
}

async fn deliver(
    mut receiver: mpsc::UnboundedReceiver<StepReport>,
    requeue: mpsc::UnboundedSender<StepReport>,
    repository: Arc<dyn ExecutionRepository>,
    retry_interval: Duration,
    cancel: CancellationToken,
) {
    info!("Log shipper started");

    loop {
        let report = tokio::select! {
            _ = cancel.cancelled() => break,
            report = receiver.recv() => match report {
                Some(report) => report,
                None => break,
            },
        };

        let delivery = repository
            .report_step(report.execution_id, &report.step_state, report.result)
            .await;

        match delivery {
            Ok(()) => debug!(
                "Delivered step {} of execution {}",
                report.step_state.step_id, report.execution_id
            ),
            Err(e) if e.is_transient() => {
                warn!(
                    "Orchestrator unreachable, will retry step {} of execution {}: {}",
                    report.step_state.step_id, report.execution_id, e
                );
                let _ = requeue.send(report);

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(retry_interval) => {}
                }
            }
            Err(e) => error!(
                "Dropping step {} of execution {}: {}",
                report.step_state.step_id, report.execution_id, e
            ),
        }
    }

    info!("Log shipper stopped");
}
