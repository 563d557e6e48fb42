//! Variable Set Repository

use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use courier_core::dto::variables::CreateVariableSet;
use sqlx::SqlitePool;

use super::{from_json, to_json};

/// Create a new variable set
pub async fn create(pool: &SqlitePool, req: CreateVariableSet) -> Result<VariableSet, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO variable_sets (tenant, environment, variable_values)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(req.instance.tenant())
    .bind(req.instance.environment())
    .bind(to_json(&req.values)?)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(VariableSet {
        id,
        instance: req.instance,
        values: req.values,
    })
}

/// Find a variable set by ID
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<VariableSet>, sqlx::Error> {
    let row = sqlx::query_as::<_, VariableSetRow>(
        r#"
        SELECT id, tenant, environment, variable_values
        FROM variable_sets
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(VariableSet::try_from).transpose()
}

/// Find the variable sets of an instance
pub async fn find_by_instance(
    pool: &SqlitePool,
    instance: &Instance,
) -> Result<Vec<VariableSet>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VariableSetRow>(
        r#"
        SELECT id, tenant, environment, variable_values
        FROM variable_sets
        WHERE tenant = ? AND environment = ?
        ORDER BY id ASC
        "#,
    )
    .bind(instance.tenant())
    .bind(instance.environment())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(VariableSet::try_from).collect()
}

/// Replace a variable set
pub async fn update(pool: &SqlitePool, id: i64, req: &CreateVariableSet) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE variable_sets
        SET tenant = ?, environment = ?, variable_values = ?
        WHERE id = ?
        "#,
    )
    .bind(req.instance.tenant())
    .bind(req.instance.environment())
    .bind(to_json(&req.values)?)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a variable set by ID
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM variable_sets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct VariableSetRow {
    id: i64,
    tenant: String,
    environment: String,
    variable_values: String,
}

impl TryFrom<VariableSetRow> for VariableSet {
    type Error = sqlx::Error;

    fn try_from(row: VariableSetRow) -> Result<Self, Self::Error> {
        Ok(VariableSet {
            id: row.id,
            instance: Instance::new(row.tenant, row.environment),
            values: from_json(&row.variable_values)?,
        })
    }
}
