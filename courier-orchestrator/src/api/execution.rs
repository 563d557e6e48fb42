//! Execution API Handlers
//!
//! HTTP endpoints for the execution lifecycle, including the agent-facing
//! long-poll and step report.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use courier_core::domain::execution::{Execution, StepState};
use courier_core::domain::instance::Instance;
use courier_core::dto::execution::{CheckQuery, CreateExecution, ExecutionFilter, ReportQuery};
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};
use crate::service::execution_service;
use crate::state::AppState;

// =============================================================================
// Operator Endpoints
// =============================================================================

/// POST /api/v1/executions
/// Create an execution, declining pending ones of the same instance
pub async fn create_execution(
    State(state): State<AppState>,
    Json(req): Json<CreateExecution>,
) -> ApiResult<Json<i64>> {
    tracing::info!(
        "Creating execution of template {} on {}",
        req.template_id,
        req.instance
    );

    let id = execution_service::create_execution(&state, req).await?;
    Ok(Json(id))
}

/// GET /api/v1/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Execution>> {
    tracing::debug!("Getting execution: {}", id);

    let execution = execution_service::get_execution(&state, id).await?;
    Ok(Json(execution))
}

/// GET /api/v1/executions?tenant=&environment=
pub async fn list_executions(
    State(state): State<AppState>,
    Query(filter): Query<ExecutionFilter>,
) -> ApiResult<Json<Vec<Execution>>> {
    tracing::debug!("Listing executions: {:?}", filter);

    let executions = execution_service::list_executions(&state, &filter).await?;
    Ok(Json(executions))
}

// =============================================================================
// Agent Endpoints
// =============================================================================

/// GET /api/v1/executions/{tenant}/{environment}/check?timeout=secs
/// Long-poll for the next execution; 404 when none arrived in the window
pub async fn check(
    State(state): State<AppState>,
    Path((tenant, environment)): Path<(String, String)>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<Json<i64>> {
    let instance = Instance::new(tenant, environment);
    let timeout = query.timeout.map(Duration::from_secs);

    match execution_service::check(&state, &instance, timeout).await? {
        Some(id) => Ok(Json(id)),
        None => Err(ApiError::NotFound(format!(
            "No execution available for {}",
            instance
        ))),
    }
}

/// PUT /api/v1/executions/{id}?result=Successed|Failed
/// Append a step state; `result` marks the final report of an attempt
pub async fn report_step(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ReportQuery>,
    Json(step): Json<StepState>,
) -> ApiResult<()> {
    execution_service::report_step(&state, id, step, query.result).await?;
    Ok(())
}
