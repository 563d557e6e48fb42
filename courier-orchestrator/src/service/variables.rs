//! Variable Set Service

use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use courier_core::dto::variables::CreateVariableSet;
use sqlx::SqlitePool;

use crate::repository::variables_repository;

/// Service error type
#[derive(Debug)]
pub enum VariableError {
    NotFound(i64),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for VariableError {
    fn from(err: sqlx::Error) -> Self {
        VariableError::DatabaseError(err)
    }
}

/// Create a new variable set
pub async fn create_variable_set(
    pool: &SqlitePool,
    req: CreateVariableSet,
) -> Result<VariableSet, VariableError> {
    validate_request(&req)?;

    let set = variables_repository::create(pool, req).await?;
    tracing::info!("Variable set {} created for {}", set.id, set.instance);

    Ok(set)
}

/// Get a variable set by ID
pub async fn get_variable_set(pool: &SqlitePool, id: i64) -> Result<VariableSet, VariableError> {
    variables_repository::find_by_id(pool, id)
        .await?
        .ok_or(VariableError::NotFound(id))
}

/// Find the variable sets of an instance
pub async fn find_by_instance(
    pool: &SqlitePool,
    instance: &Instance,
) -> Result<Vec<VariableSet>, VariableError> {
    let sets = variables_repository::find_by_instance(pool, instance).await?;
    Ok(sets)
}

/// Replace a variable set
pub async fn update_variable_set(
    pool: &SqlitePool,
    id: i64,
    req: CreateVariableSet,
) -> Result<VariableSet, VariableError> {
    validate_request(&req)?;

    if !variables_repository::update(pool, id, &req).await? {
        return Err(VariableError::NotFound(id));
    }

    tracing::info!("Variable set {} updated", id);
    Ok(VariableSet {
        id,
        instance: req.instance,
        values: req.values,
    })
}

/// Delete a variable set
pub async fn delete_variable_set(pool: &SqlitePool, id: i64) -> Result<(), VariableError> {
    if !variables_repository::delete(pool, id).await? {
        return Err(VariableError::NotFound(id));
    }

    tracing::info!("Variable set {} deleted", id);
    Ok(())
}

fn validate_request(req: &CreateVariableSet) -> Result<(), VariableError> {
    if req.instance.tenant().trim().is_empty() || req.instance.environment().trim().is_empty() {
        return Err(VariableError::ValidationError(
            "Tenant and environment are required".to_string(),
        ));
    }

    if let Some(key) = req.values.keys().find(|k| k.trim().is_empty()) {
        return Err(VariableError::ValidationError(format!(
            "Invalid variable name: '{}'",
            key
        )));
    }

    Ok(())
}
