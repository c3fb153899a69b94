//! Durable refresh-token store. All session state lives here; every
//! security-relevant transition is a single conditional UPDATE so concurrent
//! callers can never both win on the same row.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::Result;
use crate::models::RefreshToken;

pub async fn create(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken> {
    let row = sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO refresh_tokens (user_id, token, expires_at, revoked)
        VALUES ($1, $2, $3, false)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Exact-match lookup on the opaque value, regardless of state.
pub async fn find_by_value(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<Option<RefreshToken>> {
    let row = sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Burn a refresh-token value: flip revoked only if it is still unburned.
/// Returns true when this caller won. Two concurrent refreshes racing on the
/// same value serialize here; the loser sees zero rows affected.
pub async fn consume(executor: impl PgExecutor<'_>, token: &str) -> Result<bool> {
    let result =
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE token = $1 AND revoked = false")
            .bind(token)
            .execute(executor)
            .await?;

    Ok(result.rows_affected() == 1)
}

/// Revoke every non-revoked token of a user in one statement (logout and the
/// theft-detection cascade). Returns how many were newly revoked.
pub async fn revoke_all_for_user(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = true WHERE user_id = $1 AND revoked = false",
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Delete rows past expiry, revoked or not. Storage hygiene, not a security
/// transition; expired rows are already unusable.
pub async fn sweep_expired(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < CURRENT_TIMESTAMP")
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
