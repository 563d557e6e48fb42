//! Dispatch Service
//!
//! Execution lifecycle: creation with supersede, long-poll hand-out to agents
//! and the retry policy applied to step reports.

use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::dto::execution::{CreateExecution, ExecutionFilter};
use std::time::Duration;
use tokio::time::Instant;

use crate::queue::{QueueError, validate_segment};
use crate::repository::execution_repository;
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum ExecutionError {
    NotFound(i64),
    /// The execution already reached a terminal state
    Terminal(i64, ExecutionState),
    ValidationError(String),
    QueueError(QueueError),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        ExecutionError::DatabaseError(err)
    }
}

impl From<QueueError> for ExecutionError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::InvalidName(name) => {
                ExecutionError::ValidationError(format!("Invalid instance name: {}", name))
            }
            other => ExecutionError::QueueError(other),
        }
    }
}

/// State change decided for a step report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Intermediate report; state untouched
    Unchanged,
    /// Re-enqueue after the backoff with the given retry count
    Retry { retry_count: u32 },
    /// Move to a terminal state
    Finish(ExecutionState),
}

/// Applies the retry policy to a report carrying `result`
///
/// A failure is retried unless the execution is already retrying with its
/// budget spent.
pub fn next_transition(
    state: ExecutionState,
    retry_count: u32,
    result: Option<ExecutionState>,
    max_retries: u32,
) -> Result<Transition, ExecutionError> {
    match result {
        None => Ok(Transition::Unchanged),
        Some(ExecutionState::Succeeded) => Ok(Transition::Finish(ExecutionState::Succeeded)),
        Some(ExecutionState::Failed) => {
            if state != ExecutionState::Retrying || retry_count < max_retries {
                Ok(Transition::Retry {
                    retry_count: retry_count + 1,
                })
            } else {
                Ok(Transition::Finish(ExecutionState::Failed))
            }
        }
        Some(other) => Err(ExecutionError::ValidationError(format!(
            "Invalid report result: {} (expected Successed or Failed)",
            other
        ))),
    }
}

/// Create an execution and enqueue it, declining pending ones of its instance
pub async fn create_execution(state: &AppState, req: CreateExecution) -> Result<i64, ExecutionError> {
    validate_instance(&req.instance)?;

    // Open the queue first so a bad instance never reaches the store.
    let queue = state.queues.ensure(&req.instance).await?;

    let (execution, declined) = execution_repository::create_superseding(&state.pool, req).await?;
    if declined > 0 {
        tracing::info!(
            "Declined {} pending execution(s) on {}",
            declined,
            execution.instance
        );
    }

    queue.enqueue(execution.id).await?;

    tracing::info!(
        "Execution {} created for template {} on {}",
        execution.id,
        execution.template_id,
        execution.instance
    );

    Ok(execution.id)
}

/// Get an execution by ID
pub async fn get_execution(state: &AppState, id: i64) -> Result<Execution, ExecutionError> {
    execution_repository::find_by_id(&state.pool, id)
        .await?
        .ok_or(ExecutionError::NotFound(id))
}

/// List executions, newest first
pub async fn list_executions(
    state: &AppState,
    filter: &ExecutionFilter,
) -> Result<Vec<Execution>, ExecutionError> {
    let executions = execution_repository::list(&state.pool, filter).await?;
    Ok(executions)
}

/// Long-poll the queue of `instance` for the next pending execution
///
/// Waits up to `timeout`, capped by the configured long-poll window. Ids
/// whose execution is no longer pending are committed away and skipped.
/// Returns `None` on timeout or server shutdown.
pub async fn check(
    state: &AppState,
    instance: &Instance,
    timeout: Option<Duration>,
) -> Result<Option<i64>, ExecutionError> {
    validate_instance(instance)?;

    let window = timeout
        .unwrap_or(state.settings.long_poll_timeout)
        .min(state.settings.long_poll_timeout);
    let deadline = Instant::now() + window;
    let queue = state.queues.ensure(instance).await?;

    loop {
        if let Some(session) = queue.try_dequeue().await? {
            let id = session.flush().await?;

            match execution_repository::find_state(&state.pool, id).await? {
                Some((current, _)) if current.is_pending() => {
                    tracing::info!("Dispatching execution {} on {}", id, instance);
                    return Ok(Some(id));
                }
                Some((current, _)) => {
                    tracing::debug!("Skipping execution {} in state {}", id, current);
                }
                None => {
                    tracing::debug!("Skipping unknown execution {}", id);
                }
            }
            continue;
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        let pause = state.settings.check_poll_interval.min(deadline - now);
        tokio::select! {
            _ = state.shutdown.cancelled() => return Ok(None),
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

/// Record a step report and apply the retry policy
pub async fn report_step(
    state: &AppState,
    id: i64,
    step: StepState,
    result: Option<ExecutionState>,
) -> Result<(), ExecutionError> {
    let execution = get_execution(state, id).await?;

    if execution.state.is_terminal() {
        return Err(ExecutionError::Terminal(id, execution.state));
    }

    let transition = next_transition(
        execution.state,
        execution.retry_count,
        result,
        state.settings.max_retries,
    )?;

    execution_repository::add_step(&state.pool, id, &step).await?;

    tracing::info!(
        "Execution {} step {} '{}' reported by {}: success={}",
        id,
        step.step_id,
        step.step_name,
        step.executor,
        step.success
    );

    match transition {
        Transition::Unchanged => {}
        Transition::Finish(final_state) => {
            execution_repository::update_state(&state.pool, id, final_state, execution.retry_count)
                .await?;
            tracing::info!("Execution {} finished: {}", id, final_state);
        }
        Transition::Retry { retry_count } => {
            tokio::time::sleep(state.settings.retry_backoff).await;

            let updated = execution_repository::update_state(
                &state.pool,
                id,
                ExecutionState::Retrying,
                retry_count,
            )
            .await?;

            // Superseded while backing off; nothing left to retry.
            if !updated {
                tracing::info!("Execution {} left pending state during backoff", id);
                return Ok(());
            }

            let queue = state.queues.ensure(&execution.instance).await?;
            queue.enqueue(id).await?;

            tracing::warn!("Execution {} failed, retry {} scheduled", id, retry_count);
        }
    }

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_instance(instance: &Instance) -> Result<(), ExecutionError> {
    validate_segment(instance.tenant())?;
    validate_segment(instance.environment())?;
    Ok(())
}
