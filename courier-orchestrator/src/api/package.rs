//! Package API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use courier_core::domain::package::Package;
use courier_core::dto::package::PackageQuery;

use crate::api::error::{ApiError, ApiResult};
use crate::service::package_service;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// POST /api/v1/packages
/// Multipart upload with a `version` text field and a `body` file field
pub async fn upload_package(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<String>> {
    let mut version = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);

        match name.as_deref() {
            Some("version") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable version: {}", e)))?;
                version = Some(text);
            }
            Some("body") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("Body part has no file name".to_string()))?;
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable body: {}", e)))?;
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let version = version.ok_or_else(|| ApiError::BadRequest("Missing version field".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing body field".to_string()))?;

    tracing::info!("Uploading package {} version {}", file_name, version);

    let id = package_service::upload_package(
        &state.pool,
        &state.storage,
        &file_name,
        &version,
        &content_type,
        &bytes,
    )
    .await?;

    Ok(Json(id))
}

/// GET /api/v1/packages
pub async fn list_packages(State(state): State<AppState>) -> ApiResult<Json<Vec<Package>>> {
    let packages = package_service::list_packages(&state.pool).await?;
    Ok(Json(packages))
}

/// GET /api/v1/packages/{file_name}?version=
/// Package with its body; latest version when `version` is omitted
pub async fn get_package(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    Query(query): Query<PackageQuery>,
) -> ApiResult<Json<Package>> {
    let package = package_service::get_package(
        &state.pool,
        &state.storage,
        &file_name,
        query.version.as_deref(),
    )
    .await?;

    Ok(Json(package))
}
