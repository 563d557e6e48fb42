//! Execution Repository
//!
//! Handles all database operations related to executions and their
//! append-only step states.

use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::dto::execution::{CreateExecution, ExecutionFilter};
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::{from_json, to_json};

/// Inserts a new `Added` execution, declining pending ones of the same instance
///
/// Both writes happen in one transaction. Returns the new execution and the
/// number of executions declined.
pub async fn create_superseding(
    pool: &SqlitePool,
    req: CreateExecution,
) -> Result<(Execution, u64), sqlx::Error> {
    let now = chrono::Utc::now();
    let overrides = to_json(&req.variable_overrides)?;

    let mut tx = pool.begin().await?;

    let declined = sqlx::query(
        r#"
        UPDATE executions
        SET state = ?, updated_at = ?
        WHERE tenant = ? AND environment = ? AND state IN (?, ?)
        "#,
    )
    .bind(ExecutionState::Declined.as_str())
    .bind(now)
    .bind(req.instance.tenant())
    .bind(req.instance.environment())
    .bind(ExecutionState::Added.as_str())
    .bind(ExecutionState::Retrying.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let id = sqlx::query(
        r#"
        INSERT INTO executions (template_id, variable_set_id, tenant, environment,
                                retry_count, state, variable_overrides, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)
        "#,
    )
    .bind(req.template_id)
    .bind(req.variable_set_id)
    .bind(req.instance.tenant())
    .bind(req.instance.environment())
    .bind(ExecutionState::Added.as_str())
    .bind(overrides)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    let execution = Execution {
        id,
        template_id: req.template_id,
        variable_set_id: req.variable_set_id,
        instance: req.instance,
        retry_count: 0,
        state: ExecutionState::Added,
        steps_states: Vec::new(),
        variable_overrides: req.variable_overrides,
        created_at: now,
        updated_at: now,
    };

    Ok((execution, declined))
}

/// Find an execution by ID, with its step states
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Execution>, sqlx::Error> {
    let row = sqlx::query_as::<_, ExecutionRow>(
        r#"
        SELECT id, template_id, variable_set_id, tenant, environment, retry_count,
               state, variable_overrides, created_at, updated_at
        FROM executions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let steps = find_steps(pool, row.id).await?;
            Ok(Some(row.into_execution(steps)?))
        }
        None => Ok(None),
    }
}

/// Find the current state and retry count of an execution
pub async fn find_state(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<(ExecutionState, u32)>, sqlx::Error> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT state, retry_count FROM executions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    row.map(|(state, retry_count)| Ok((string_to_state(&state)?, retry_count as u32)))
        .transpose()
}

/// List executions, newest first
pub async fn list(pool: &SqlitePool, filter: &ExecutionFilter) -> Result<Vec<Execution>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExecutionRow>(
        r#"
        SELECT id, template_id, variable_set_id, tenant, environment, retry_count,
               state, variable_overrides, created_at, updated_at
        FROM executions
        WHERE (?1 IS NULL OR tenant = ?1) AND (?2 IS NULL OR environment = ?2)
        ORDER BY id DESC
        "#,
    )
    .bind(filter.tenant.as_deref())
    .bind(filter.environment.as_deref())
    .fetch_all(pool)
    .await?;

    let mut executions = Vec::with_capacity(rows.len());
    for row in rows {
        let steps = find_steps(pool, row.id).await?;
        executions.push(row.into_execution(steps)?);
    }

    Ok(executions)
}

/// Append a step state to an execution
pub async fn add_step(pool: &SqlitePool, execution_id: i64, step: &StepState) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO step_states (execution_id, step_id, step_name, executor, success, log, reported_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(execution_id)
    .bind(step.step_id)
    .bind(&step.step_name)
    .bind(&step.executor)
    .bind(step.success)
    .bind(to_json(&step.log)?)
    .bind(step.reported_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Move a pending execution to a new state
///
/// Returns `false` when the execution is missing or already terminal.
pub async fn update_state(
    pool: &SqlitePool,
    id: i64,
    state: ExecutionState,
    retry_count: u32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE executions
        SET state = ?, retry_count = ?, updated_at = ?
        WHERE id = ? AND state IN (?, ?)
        "#,
    )
    .bind(state.as_str())
    .bind(i64::from(retry_count))
    .bind(chrono::Utc::now())
    .bind(id)
    .bind(ExecutionState::Added.as_str())
    .bind(ExecutionState::Retrying.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn find_steps(pool: &SqlitePool, execution_id: i64) -> Result<Vec<StepState>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StepStateRow>(
        r#"
        SELECT step_id, step_name, executor, success, log, reported_at
        FROM step_states
        WHERE execution_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(execution_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(StepState::try_from).collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

fn string_to_state(s: &str) -> Result<ExecutionState, sqlx::Error> {
    ExecutionState::parse(s)
        .ok_or_else(|| sqlx::Error::Decode(format!("Unknown execution state: {}", s).into()))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ExecutionRow {
    id: i64,
    template_id: i64,
    variable_set_id: Option<i64>,
    tenant: String,
    environment: String,
    retry_count: i64,
    state: String,
    variable_overrides: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ExecutionRow {
    fn into_execution(self, steps_states: Vec<StepState>) -> Result<Execution, sqlx::Error> {
        let variable_overrides: HashMap<String, String> = from_json(&self.variable_overrides)?;

        Ok(Execution {
            id: self.id,
            template_id: self.template_id,
            variable_set_id: self.variable_set_id,
            instance: Instance::new(self.tenant, self.environment),
            retry_count: self.retry_count as u32,
            state: string_to_state(&self.state)?,
            steps_states,
            variable_overrides,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StepStateRow {
    step_id: i32,
    step_name: String,
    executor: String,
    success: bool,
    log: String,
    reported_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<StepStateRow> for StepState {
    type Error = sqlx::Error;

    fn try_from(row: StepStateRow) -> Result<Self, Self::Error> {
        Ok(StepState {
            step_id: row.step_id,
            step_name: row.step_name,
            executor: row.executor,
            success: row.success,
            log: from_json(&row.log)?,
            reported_at: row.reported_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn request(tenant: &str) -> CreateExecution {
        CreateExecution {
            template_id: 1,
            variable_set_id: None,
            instance: Instance::new(tenant, "Prod"),
            variable_overrides: HashMap::from([("K".to_string(), "V".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let (created, declined) = create_superseding(&pool, request("Some")).await.unwrap();
        assert_eq!(declined, 0);

        let found = find_by_id(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(found.state, ExecutionState::Added);
        assert_eq!(found.instance, Instance::new("Some", "Prod"));
        assert_eq!(found.variable_overrides.get("K").map(String::as_str), Some("V"));
        assert!(found.steps_states.is_empty());
    }

    #[tokio::test]
    async fn test_steps_keep_report_order() {
        let pool = test_pool().await;
        let (execution, _) = create_superseding(&pool, request("Some")).await.unwrap();

        for order in [2, 1] {
            let step = StepState {
                step_id: order,
                step_name: format!("step {}", order),
                executor: "agent-1".to_string(),
                success: true,
                log: vec!["line".to_string()],
                reported_at: chrono::Utc::now(),
            };
            add_step(&pool, execution.id, &step).await.unwrap();
        }

        let found = find_by_id(&pool, execution.id).await.unwrap().unwrap();
        let ids: Vec<i32> = found.steps_states.iter().map(|s| s.step_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(found.steps_states[0].log, vec!["line".to_string()]);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let pool = test_pool().await;
        let (first, _) = create_superseding(&pool, request("Some")).await.unwrap();
        let (second, _) = create_superseding(&pool, request("Other")).await.unwrap();

        let all = list(&pool, &ExecutionFilter::default()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let filter = ExecutionFilter {
            tenant: Some("Some".to_string()),
            environment: None,
        };
        let some = list(&pool, &filter).await.unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].id, first.id);
    }

    #[tokio::test]
    async fn test_update_state_ignores_terminal() {
        let pool = test_pool().await;
        let (execution, _) = create_superseding(&pool, request("Some")).await.unwrap();

        assert!(update_state(&pool, execution.id, ExecutionState::Failed, 0).await.unwrap());
        assert!(!update_state(&pool, execution.id, ExecutionState::Retrying, 1).await.unwrap());
        assert_eq!(
            find_state(&pool, execution.id).await.unwrap(),
            Some((ExecutionState::Failed, 0))
        );
    }
}
