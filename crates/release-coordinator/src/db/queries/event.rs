//! Event database queries.

use crate::db::models::{Event, EventFilter, EventRow};
use crate::db::DbPool;
use crate::error::AppResult;

/// Append an event.
pub async fn insert_event(pool: &DbPool, event: &Event) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO coordinator.event
            (id, event_type, message, release_id, task_id, task_service_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&event.id)
    .bind(event.event_type.to_string())
    .bind(&event.message)
    .bind(event.release_id.as_deref())
    .bind(event.task_id.as_deref())
    .bind(event.task_service_id.as_deref())
    .bind(event.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// List events, newest first.
pub async fn list_events(pool: &DbPool, filter: &EventFilter) -> AppResult<Vec<Event>> {
    let rows = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, event_type, message, release_id, task_id, task_service_id, created_at
        FROM coordinator.event
        WHERE ($1::text IS NULL OR release_id = $1)
          AND ($2::text IS NULL OR task_id = $2)
          AND ($3::text IS NULL OR task_service_id = $3)
          AND ($4::text IS NULL OR event_type = $4)
        ORDER BY created_at DESC, id DESC
        LIMIT $5
        "#,
    )
    .bind(filter.release_id.as_deref())
    .bind(filter.task_id.as_deref())
    .bind(filter.task_service_id.as_deref())
    .bind(filter.event_type.map(|t| t.to_string()))
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Event::try_from).collect()
}

/// Most recent event that references a release.
pub async fn latest_release_event(pool: &DbPool, release_id: &str) -> AppResult<Option<Event>> {
    let mut events = list_events(
        pool,
        &EventFilter {
            limit: Some(1),
            ..EventFilter::for_release(release_id)
        },
    )
    .await?;

    Ok(events.pop())
}

/// Most recent event that references a task.
pub async fn latest_task_event(pool: &DbPool, task_id: &str) -> AppResult<Option<Event>> {
    let mut events = list_events(
        pool,
        &EventFilter {
            limit: Some(1),
            ..EventFilter::for_task(task_id)
        },
    )
    .await?;

    Ok(events.pop())
}
