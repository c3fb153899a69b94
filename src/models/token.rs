use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a refresh token can or cannot be used. `Expired` is derived from the
/// timestamp, never stored; `Revoked` wins when both apply because a revoked
/// value showing up again is a theft signal regardless of its age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUsability {
    Usable,
    Revoked,
    Expired,
}

impl RefreshToken {
    pub fn usability(&self, now: DateTime<Utc>) -> TokenUsability {
        if self.revoked {
            TokenUsability::Revoked
        } else if self.expires_at <= now {
            TokenUsability::Expired
        } else {
            TokenUsability::Usable
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.usability(now) == TokenUsability::Usable
    }
}
