//! Task database queries.

use crate::db::models::{Task, TaskFilter, TaskRow};
use crate::db::DbPool;
use crate::engine::state::TaskState;
use crate::error::AppResult;

/// Insert a new task.
pub async fn insert_task(pool: &DbPool, task: &Task) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO coordinator.task (id, state, progress, release_id, task_service_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&task.id)
    .bind(task.state.as_str())
    .bind(task.progress)
    .bind(&task.release_id)
    .bind(&task.task_service_id)
    .bind(task.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a task by ID.
pub async fn get_task(pool: &DbPool, id: &str) -> AppResult<Option<Task>> {
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, state, progress, release_id, task_service_id, created_at
        FROM coordinator.task
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Task::try_from).transpose()
}

/// List tasks in creation order.
pub async fn list_tasks(pool: &DbPool, filter: &TaskFilter) -> AppResult<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, state, progress, release_id, task_service_id, created_at
        FROM coordinator.task
        WHERE ($1::text IS NULL OR release_id = $1)
          AND ($2::text IS NULL OR task_service_id = $2)
          AND ($3::text[] IS NULL OR state = ANY($3))
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(filter.release_id.as_deref())
    .bind(filter.task_service_id.as_deref())
    .bind(filter.state_names())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Task::try_from).collect()
}

/// Compare-and-set a task's state.
pub async fn transition_task(
    pool: &DbPool,
    id: &str,
    from: TaskState,
    to: TaskState,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE coordinator.task
        SET state = $3
        WHERE id = $1 AND state = $2
        "#,
    )
    .bind(id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store a task's progress.
pub async fn update_task_progress(pool: &DbPool, id: &str, progress: i32) -> AppResult<bool> {
    let result = sqlx::query("UPDATE coordinator.task SET progress = $2 WHERE id = $1")
        .bind(id)
        .bind(progress)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
