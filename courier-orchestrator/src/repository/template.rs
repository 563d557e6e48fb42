//! Template Repository
//!
//! Handles all database operations related to templates. Steps are stored
//! as a JSON document alongside the template row.

use courier_core::domain::template::{Step, Template};
use courier_core::dto::template::CreateTemplate;
use sqlx::SqlitePool;

use super::{from_json, to_json};

/// Create a new template in the database
pub async fn create(pool: &SqlitePool, req: CreateTemplate) -> Result<Template, sqlx::Error> {
    let now = chrono::Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO templates (name, steps, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&req.name)
    .bind(to_json(&req.steps)?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(Template {
        id,
        name: req.name,
        steps: req.steps,
        created_at: now,
        updated_at: now,
    })
}

/// Find a template by ID
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Template>, sqlx::Error> {
    let row = sqlx::query_as::<_, TemplateRow>(
        r#"
        SELECT id, name, steps, created_at, updated_at
        FROM templates
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Template::try_from).transpose()
}

/// List all templates
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Template>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateRow>(
        r#"
        SELECT id, name, steps, created_at, updated_at
        FROM templates
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Template::try_from).collect()
}

/// Replace the name and steps of a template
pub async fn update(pool: &SqlitePool, id: i64, req: CreateTemplate) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE templates
        SET name = ?, steps = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(to_json(&req.steps)?)
    .bind(chrono::Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a template by ID
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM templates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: i64,
    name: String,
    steps: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = sqlx::Error;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let steps: Vec<Step> = from_json(&row.steps)?;

        Ok(Template {
            id: row.id,
            name: row.name,
            steps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
