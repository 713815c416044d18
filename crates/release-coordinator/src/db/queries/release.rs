//! Release database queries.

use crate::db::models::{Release, ReleaseFilter, ReleaseRow, Version};
use crate::db::DbPool;
use crate::engine::state::ReleaseState;
use crate::error::AppResult;

const COLUMNS: &str =
    "id, author, name, description, state, tags, version, is_major, studies, created_at";

/// Insert a new release.
pub async fn insert_release(pool: &DbPool, release: &Release) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO coordinator.release
            (id, author, name, description, state, tags, version, is_major, studies, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&release.id)
    .bind(&release.author)
    .bind(&release.name)
    .bind(&release.description)
    .bind(release.state.as_str())
    .bind(&release.tags)
    .bind(release.version.to_string())
    .bind(release.is_major)
    .bind(&release.studies)
    .bind(release.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a release by ID.
pub async fn get_release(pool: &DbPool, id: &str) -> AppResult<Option<Release>> {
    let row = sqlx::query_as::<_, ReleaseRow>(&format!(
        "SELECT {COLUMNS} FROM coordinator.release WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Release::try_from).transpose()
}

/// List releases, newest first.
pub async fn list_releases(pool: &DbPool, filter: &ReleaseFilter) -> AppResult<Vec<Release>> {
    let rows = sqlx::query_as::<_, ReleaseRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM coordinator.release
        WHERE ($1::text[] IS NULL OR state = ANY($1))
          AND ($2::text IS NULL OR $2 = ANY(studies))
          AND ($3::text IS NULL OR $3 = ANY(tags))
        ORDER BY created_at DESC
        "#
    ))
    .bind(filter.state_names())
    .bind(filter.study.as_deref())
    .bind(filter.tag.as_deref())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Release::try_from).collect()
}

/// Move a release from `from` to `to` if it is still in `from`.
///
/// Returns `false` when the stored state no longer matches.
pub async fn transition_release(
    pool: &DbPool,
    id: &str,
    from: ReleaseState,
    to: ReleaseState,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE coordinator.release
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

/// Mark a release published and set its version in one statement.
pub async fn complete_release(
    pool: &DbPool,
    id: &str,
    from: ReleaseState,
    version: Version,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE coordinator.release
        SET state = $3, version = $4
        WHERE id = $1 AND state = $2
        "#,
    )
    .bind(id)
    .bind(from.as_str())
    .bind(ReleaseState::Published.as_str())
    .bind(version.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
