use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Note, NoteSearchResult};

pub async fn create(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    title: &str,
    content: &str,
) -> Result<Note> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (user_id, title, content)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, title, content, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .fetch_one(executor)
    .await?;

    Ok(note)
}

/// Lookup scoped to the owner; another user's note behaves as if it does not
/// exist.
pub async fn find_by_id_and_user(
    executor: impl PgExecutor<'_>,
    note_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, user_id, title, content, created_at, updated_at
        FROM notes WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(note)
}

pub async fn list_by_user(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, user_id, title, content, created_at, updated_at
        FROM notes WHERE user_id = $1
        ORDER BY updated_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(notes)
}

pub async fn count_by_user(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT count(*) FROM notes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await?;

    Ok(count.0)
}

pub async fn update(
    executor: impl PgExecutor<'_>,
    note_id: Uuid,
    user_id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = coalesce($3, title),
            content = coalesce($4, content),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, title, content, created_at, updated_at
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .fetch_optional(executor)
    .await?;

    Ok(note)
}

pub async fn delete(
    executor: impl PgExecutor<'_>,
    note_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
        .bind(note_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Full-text search across title (weight A) and content (weight B).
/// plainto_tsquery keeps user input free of query syntax; ts_rank orders by
/// relevance with title matches ranking higher; ts_headline produces a
/// snippet with the matching terms wrapped in <b> tags.
pub async fn search(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<NoteSearchResult>> {
    let results = sqlx::query_as::<_, NoteSearchResult>(
        r#"
        SELECT
            n.id,
            n.user_id,
            n.title,
            n.content,
            n.created_at,
            n.updated_at,
            ts_rank(n.search_vector, plainto_tsquery('english', $2)) AS rank,
            ts_headline('english', coalesce(n.title, '') || ' ' || coalesce(n.content, ''),
                plainto_tsquery('english', $2),
                'StartSel=<b>, StopSel=</b>, MaxWords=35, MinWords=15, MaxFragments=2'
            ) AS headline
        FROM notes n
        WHERE n.user_id = $1
          AND n.search_vector @@ plainto_tsquery('english', $2)
        ORDER BY rank DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(query)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(results)
}

pub async fn count_search(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    query: &str,
) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*)
        FROM notes n
        WHERE n.user_id = $1
          AND n.search_vector @@ plainto_tsquery('english', $2)
        "#,
    )
    .bind(user_id)
    .bind(query)
    .fetch_one(executor)
    .await?;

    Ok(count.0)
}
