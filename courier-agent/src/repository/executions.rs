//! Executions repository
//!
//! Everything the agent reads from or reports to the orchestrator:
//! - Long-polling an instance queue
//! - Fetching executions, templates, variable sets and packages
//! - Reporting step states

use async_trait::async_trait;
use courier_client::{OrchestratorClient, Result};
use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::domain::package::Package;
use courier_core::domain::template::Template;
use courier_core::domain::variables::VariableSet;
use std::sync::Arc;
use std::time::Duration;

/// Repository trait for execution-related operations with the orchestrator
///
/// Errors keep the client's classification so callers can tell transient
/// failures from permanent ones.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Waits up to `timeout` for the next execution of `instance`
    async fn check(&self, instance: &Instance, timeout: Duration) -> Result<Option<i64>>;

    async fn get_execution(&self, id: i64) -> Result<Execution>;

    async fn get_template(&self, id: i64) -> Result<Template>;

    async fn get_variable_set(&self, id: i64) -> Result<VariableSet>;

    /// Fetches a package with its body; latest version when `version` is `None`
    async fn get_package(&self, file_name: &str, version: Option<&str>) -> Result<Package>;

    /// Appends a step state; `result` marks the final report of an attempt
    async fn report_step(
        &self,
        execution_id: i64,
        step_state: &StepState,
        result: Option<ExecutionState>,
    ) -> Result<()>;
}

/// HTTP implementation of ExecutionRepository
pub struct HttpExecutionRepository {
    client: Arc<OrchestratorClient>,
}

impl HttpExecutionRepository {
    pub fn new(client: Arc<OrchestratorClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutionRepository for HttpExecutionRepository {
    async fn check(&self, instance: &Instance, timeout: Duration) -> Result<Option<i64>> {
        self.client.check(instance, timeout).await
    }

    async fn get_execution(&self, id: i64) -> Result<Execution> {
        self.client.get_execution(id).await
    }

    async fn get_template(&self, id: i64) -> Result<Template> {
        self.client.get_template(id).await
    }

    async fn get_variable_set(&self, id: i64) -> Result<VariableSet> {
        self.client.get_variable_set(id).await
    }

    async fn get_package(&self, file_name: &str, version: Option<&str>) -> Result<Package> {
        self.client.get_package(file_name, version).await
    }

    async fn report_step(
        &self,
        execution_id: i64,
        step_state: &StepState,
        result: Option<ExecutionState>,
    ) -> Result<()> {
        self.client
            .report_step(execution_id, step_state, result)
            .await
    }
}
