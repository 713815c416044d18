//! Task service database queries.

use crate::db::models::TaskService;
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a new task service.
pub async fn insert_task_service(pool: &DbPool, service: &TaskService) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO coordinator.task_service
            (id, name, url, author, description, enabled, last_ok_status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&service.id)
    .bind(&service.name)
    .bind(&service.url)
    .bind(&service.author)
    .bind(&service.description)
    .bind(service.enabled)
    .bind(service.last_ok_status)
    .bind(service.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a task service by ID.
pub async fn get_task_service(pool: &DbPool, id: &str) -> AppResult<Option<TaskService>> {
    let service = sqlx::query_as::<_, TaskService>(
        r#"
        SELECT id, name, url, author, description, enabled, last_ok_status, created_at
        FROM coordinator.task_service
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

/// List task services in registration order, optionally only enabled ones.
pub async fn list_task_services(pool: &DbPool, enabled_only: bool) -> AppResult<Vec<TaskService>> {
    let services = sqlx::query_as::<_, TaskService>(
        r#"
        SELECT id, name, url, author, description, enabled, last_ok_status, created_at
        FROM coordinator.task_service
        WHERE ($1 = FALSE OR enabled)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(enabled_only)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// Enable or disable a task service.
pub async fn set_enabled(pool: &DbPool, id: &str, enabled: bool) -> AppResult<bool> {
    let result = sqlx::query("UPDATE coordinator.task_service SET enabled = $2 WHERE id = $1")
        .bind(id)
        .bind(enabled)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a health check result and return the new failure streak.
///
/// Success resets the counter to 0; failure increments it atomically.
pub async fn record_health(pool: &DbPool, id: &str, healthy: bool) -> AppResult<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE coordinator.task_service
        SET last_ok_status = CASE WHEN $2 THEN 0 ELSE last_ok_status + 1 END
        WHERE id = $1
        RETURNING last_ok_status
        "#,
    )
    .bind(id)
    .bind(healthy)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}
