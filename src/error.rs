use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Refresh token reuse detected")]
    RefreshTokenReuse,

    #[error("Invalid access token")]
    TokenInvalid,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Stable machine-readable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateEmail => "EMAIL_ALREADY_REGISTERED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ApiError::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            ApiError::RefreshTokenReuse => "REFRESH_TOKEN_REUSED",
            ApiError::TokenInvalid => "TOKEN_INVALID",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Unauthorized => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::Database(_) => "INTERNAL_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::InvalidCredentials
            | ApiError::InvalidRefreshToken
            | ApiError::RefreshTokenExpired
            | ApiError::RefreshTokenReuse
            | ApiError::TokenInvalid
            | ApiError::TokenExpired
            | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage and other internal failures are logged in full but never
        // leak details to the caller.
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RefreshTokenReuse.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_expiry_and_reuse_have_distinct_codes() {
        assert_ne!(
            ApiError::RefreshTokenExpired.code(),
            ApiError::RefreshTokenReuse.code()
        );
    }
}
