//! Session lifecycle: register, login, refresh (with rotation and theft
//! detection) and logout. All session state lives in the refresh-token store;
//! each operation runs inside explicit transaction boundaries where more than
//! one row is touched.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::{token_repo, user_repo};
use crate::error::{ApiError, Result};
use crate::models::{TokenUsability, User};
use crate::security::{password, TokenSigner};

#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    signer: TokenSigner,
    refresh_ttl: Duration,
}

/// Token pair issued on register/login/refresh. The refresh value is handed
/// to the transport layer for cookie delivery and is never serialized into a
/// response body.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub tokens: SessionTokens,
}

impl AuthService {
    pub fn new(db: PgPool, signer: TokenSigner, refresh_ttl: Duration) -> Self {
        Self {
            db,
            signer,
            refresh_ttl,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(User, SessionTokens)> {
        let email = normalize_email(email);
        let password = password.trim();
        let display_name = display_name.trim();

        let mut tx = self.db.begin().await?;

        // Friendly pre-check; the unique constraint still catches a register
        // racing on the same email.
        if user_repo::exists_by_email(&mut *tx, &email).await? {
            return Err(ApiError::DuplicateEmail);
        }

        let password_hash = password::hash_password(password)?;
        let user = user_repo::create_user(&mut *tx, &email, &password_hash, display_name).await?;
        let tokens = self.issue_tokens(&mut *tx, &user).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok((user, tokens))
    }

    /// Unknown email and wrong password are deliberately indistinguishable.
    /// Logins are additive: prior refresh tokens stay valid.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, SessionTokens)> {
        let email = normalize_email(email);
        let password = password.trim();

        let user = user_repo::find_by_email(&self.db, &email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        password::verify_password(password, &user.password_hash)?;

        let tokens = self.issue_tokens(&self.db, &user).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, tokens))
    }

    /// Verify-and-burn plus replacement issuance as one atomic operation: the
    /// presented value is invalidated and a new pair issued in the same
    /// transaction, so a legitimate client is never left without a usable
    /// refresh token.
    pub async fn refresh(&self, refresh_value: &str) -> Result<RefreshedSession> {
        let mut tx = self.db.begin().await?;

        let token = token_repo::find_by_value(&mut *tx, refresh_value)
            .await?
            .ok_or(ApiError::InvalidRefreshToken)?;

        match token.usability(Utc::now()) {
            TokenUsability::Revoked => {
                // An already-burned value showing up again means the value
                // leaked. Fail safe: invalidate every session of this user.
                let revoked = token_repo::revoke_all_for_user(&mut *tx, token.user_id).await?;
                tx.commit().await?;
                tracing::warn!(
                    user_id = %token.user_id,
                    revoked,
                    "refresh token reuse detected, all sessions revoked"
                );
                Err(ApiError::RefreshTokenReuse)
            }
            TokenUsability::Expired => {
                // A natural lapse, not an attack. No cascade.
                Err(ApiError::RefreshTokenExpired)
            }
            TokenUsability::Usable => {
                if !token_repo::consume(&mut *tx, refresh_value).await? {
                    // A concurrent refresh burned this value between our read
                    // and the conditional update. Same theft signal as above.
                    let revoked = token_repo::revoke_all_for_user(&mut *tx, token.user_id).await?;
                    tx.commit().await?;
                    tracing::warn!(
                        user_id = %token.user_id,
                        revoked,
                        "lost refresh rotation race, all sessions revoked"
                    );
                    return Err(ApiError::RefreshTokenReuse);
                }

                let user = user_repo::find_by_id(&mut *tx, token.user_id)
                    .await?
                    .ok_or_else(|| {
                        ApiError::Internal(anyhow::anyhow!(
                            "refresh token {} has no owning user",
                            token.id
                        ))
                    })?;

                let tokens = self.issue_tokens(&mut *tx, &user).await?;
                tx.commit().await?;

                tracing::debug!(user_id = %user.id, "access token refreshed, rotation complete");
                Ok(RefreshedSession {
                    user_id: user.id,
                    email: user.email,
                    display_name: user.display_name,
                    tokens,
                })
            }
        }
    }

    /// Revoke every active refresh token of the user. Idempotent; a second
    /// call (or an unknown user) revokes zero.
    pub async fn logout(&self, user_id: Uuid) -> Result<u64> {
        let revoked = token_repo::revoke_all_for_user(&self.db, user_id).await?;
        tracing::info!(%user_id, revoked, "user logged out");
        Ok(revoked)
    }

    async fn issue_tokens(
        &self,
        executor: impl PgExecutor<'_>,
        user: &User,
    ) -> Result<SessionTokens> {
        let access_token = self.signer.issue_access_token(user.id, &user.email)?;
        let refresh_value = self.signer.issue_refresh_value();
        let expires_at = Utc::now() + self.refresh_ttl;

        let row = token_repo::create(executor, user.id, &refresh_value, expires_at).await?;

        Ok(SessionTokens {
            access_token,
            refresh_token: row.token,
            refresh_expires_at: row.expires_at,
        })
    }
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
