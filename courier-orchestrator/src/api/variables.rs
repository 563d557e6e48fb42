//! Variable Set API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use courier_core::dto::variables::CreateVariableSet;

use crate::api::error::ApiResult;
use crate::service::variables_service;
use crate::state::AppState;

/// POST /api/v1/variables
pub async fn create_variable_set(
    State(state): State<AppState>,
    Json(req): Json<CreateVariableSet>,
) -> ApiResult<Json<VariableSet>> {
    let set = variables_service::create_variable_set(&state.pool, req).await?;
    Ok(Json(set))
}

/// GET /api/v1/variables/{id}
pub async fn get_variable_set(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<VariableSet>> {
    let set = variables_service::get_variable_set(&state.pool, id).await?;
    Ok(Json(set))
}

/// GET /api/v1/variables/{tenant}/{environment}
pub async fn find_by_instance(
    State(state): State<AppState>,
    Path((tenant, environment)): Path<(String, String)>,
) -> ApiResult<Json<Vec<VariableSet>>> {
    let instance = Instance::new(tenant, environment);
    let sets = variables_service::find_by_instance(&state.pool, &instance).await?;
    Ok(Json(sets))
}

/// PUT /api/v1/variables/{id}
pub async fn update_variable_set(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateVariableSet>,
) -> ApiResult<Json<VariableSet>> {
    let set = variables_service::update_variable_set(&state.pool, id, req).await?;
    Ok(Json(set))
}

/// DELETE /api/v1/variables/{id}
pub async fn delete_variable_set(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    variables_service::delete_variable_set(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
