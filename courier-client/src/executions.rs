//! Execution-related API endpoints

use std::time::Duration;

use crate::OrchestratorClient;
use crate::error::Result;
use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::dto::execution::{CheckQuery, CreateExecution, ExecutionFilter, ReportQuery};
use reqwest::StatusCode;

/// Slack added to the HTTP timeout of a long-poll on top of its window
const CHECK_GRACE: Duration = Duration::from_secs(30);

impl OrchestratorClient {
    // =============================================================================
    // Execution Lifecycle
    // =============================================================================

    /// Create an execution, declining any pending one for the same instance
    ///
    /// # Returns
    /// The id of the created execution
    pub async fn create_execution(&self, req: &CreateExecution) -> Result<i64> {
        let response = self
            .client
            .post(self.url("/executions"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get an execution by id
    pub async fn get_execution(&self, id: i64) -> Result<Execution> {
        let url = self.url(&format!("/executions/{}", id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List executions, newest first, optionally filtered by instance parts
    pub async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<Execution>> {
        let response = self
            .client
            .get(self.url("/executions"))
            .query(filter)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Agent Endpoints
    // =============================================================================

    /// Long-poll the instance queue for the next execution
    ///
    /// Blocks server-side for up to `timeout`. Returns `None` when no work
    /// arrived within the window.
    pub async fn check(&self, instance: &Instance, timeout: Duration) -> Result<Option<i64>> {
        let url = self.url(&format!(
            "/executions/{}/{}/check",
            instance.tenant(),
            instance.environment()
        ));
        let response = self
            .client
            .get(&url)
            .query(&CheckQuery {
                timeout: Some(timeout.as_secs()),
            })
            .timeout(timeout + CHECK_GRACE)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        self.handle_response(response).await.map(Some)
    }

    /// Append a step state to an execution
    ///
    /// `result` marks the final report of an attempt and drives the
    /// orchestrator's retry policy.
    pub async fn report_step(
        &self,
        id: i64,
        step_state: &StepState,
        result: Option<ExecutionState>,
    ) -> Result<()> {
        let url = self.url(&format!("/executions/{}", id));
        let response = self
            .client
            .put(&url)
            .query(&ReportQuery { result })
            .json(step_state)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
