//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::{
    execution::ExecutionError, package::PackageError, template::TemplateError,
    variables::VariableError,
};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    DatabaseError(sqlx::Error),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::NotFound(id) => ApiError::NotFound(format!("Execution {} not found", id)),
            ExecutionError::Terminal(id, state) => {
                ApiError::Conflict(format!("Execution {} is already {}", id, state))
            }
            ExecutionError::ValidationError(msg) => ApiError::BadRequest(msg),
            ExecutionError::QueueError(err) => ApiError::InternalError(err.to_string()),
            ExecutionError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(id) => ApiError::NotFound(format!("Template {} not found", id)),
            TemplateError::ValidationError(msg) => ApiError::BadRequest(msg),
            TemplateError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<VariableError> for ApiError {
    fn from(err: VariableError) -> Self {
        match err {
            VariableError::NotFound(id) => {
                ApiError::NotFound(format!("Variable set {} not found", id))
            }
            VariableError::ValidationError(msg) => ApiError::BadRequest(msg),
            VariableError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<PackageError> for ApiError {
    fn from(err: PackageError) -> Self {
        match err {
            PackageError::NotFound(what) => ApiError::NotFound(format!("Package {} not found", what)),
            PackageError::ValidationError(msg) => ApiError::BadRequest(msg),
            PackageError::StorageError(err) => ApiError::InternalError(err.to_string()),
            PackageError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
