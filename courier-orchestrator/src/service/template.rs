//! Template Service
//!
//! Business logic for template management.

use courier_core::domain::template::{StepType, Template};
use courier_core::dto::template::CreateTemplate;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::repository::template_repository;

/// Service error type
#[derive(Debug)]
pub enum TemplateError {
    NotFound(i64),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for TemplateError {
    fn from(err: sqlx::Error) -> Self {
        TemplateError::DatabaseError(err)
    }
}

/// Create a new template
pub async fn create_template(pool: &SqlitePool, req: CreateTemplate) -> Result<Template, TemplateError> {
    validate_template(&req)?;

    let template = template_repository::create(pool, req).await?;

    tracing::info!(
        "Template created: {} ({}) with {} step(s)",
        template.id,
        template.name,
        template.steps.len()
    );

    Ok(template)
}

/// Get a template by ID
pub async fn get_template(pool: &SqlitePool, id: i64) -> Result<Template, TemplateError> {
    template_repository::find_by_id(pool, id)
        .await?
        .ok_or(TemplateError::NotFound(id))
}

/// List all templates
pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<Template>, TemplateError> {
    let templates = template_repository::list_all(pool).await?;
    Ok(templates)
}

/// Replace a template
pub async fn update_template(
    pool: &SqlitePool,
    id: i64,
    req: CreateTemplate,
) -> Result<Template, TemplateError> {
    validate_template(&req)?;

    if !template_repository::update(pool, id, req).await? {
        return Err(TemplateError::NotFound(id));
    }

    tracing::info!("Template updated: {}", id);
    get_template(pool, id).await
}

/// Delete a template
pub async fn delete_template(pool: &SqlitePool, id: i64) -> Result<(), TemplateError> {
    if !template_repository::delete(pool, id).await? {
        return Err(TemplateError::NotFound(id));
    }

    tracing::info!("Template deleted: {}", id);
    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_template(req: &CreateTemplate) -> Result<(), TemplateError> {
    let mut orders = HashSet::new();

    for step in &req.steps {
        if !orders.insert(step.order) {
            return Err(TemplateError::ValidationError(format!(
                "Duplicate step order: {}",
                step.order
            )));
        }

        let has_file = step.file_name.as_deref().is_some_and(|f| !f.trim().is_empty());
        if step.step_type == StepType::Archive && !has_file {
            return Err(TemplateError::ValidationError(format!(
                "Archive step '{}' needs a file_name",
                step.name
            )));
        }
    }

    Ok(())
}
