use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::User;

/// Create a new user. A concurrent register racing on the same email loses on
/// the unique constraint and is reported as `DuplicateEmail`.
pub async fn create_user(
    executor: impl PgExecutor<'_>,
    email: &str,
    password_hash: &str,
    display_name: &str,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, display_name)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .fetch_one(executor)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::DuplicateEmail,
        _ => ApiError::Database(e),
    })
}

pub async fn find_by_email(executor: impl PgExecutor<'_>, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

pub async fn find_by_id(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

pub async fn exists_by_email(executor: impl PgExecutor<'_>, email: &str) -> Result<bool> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(executor)
            .await?;

    Ok(exists.0)
}
