//! Template API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use courier_core::domain::template::Template;
use courier_core::dto::template::CreateTemplate;

use crate::api::error::ApiResult;
use crate::service::template_service;
use crate::state::AppState;

/// POST /api/v1/templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplate>,
) -> ApiResult<Json<Template>> {
    tracing::info!("Creating template: {}", req.name);

    let template = template_service::create_template(&state.pool, req).await?;
    Ok(Json(template))
}

/// GET /api/v1/templates
pub async fn list_templates(State(state): State<AppState>) -> ApiResult<Json<Vec<Template>>> {
    let templates = template_service::list_templates(&state.pool).await?;
    Ok(Json(templates))
}

/// GET /api/v1/templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Template>> {
    let template = template_service::get_template(&state.pool, id).await?;
    Ok(Json(template))
}

/// PUT /api/v1/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateTemplate>,
) -> ApiResult<Json<Template>> {
    let template = template_service::update_template(&state.pool, id, req).await?;
    Ok(Json(template))
}

/// DELETE /api/v1/templates/{id}
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    template_service::delete_template(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
