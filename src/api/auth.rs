use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::middleware::MaybeUser;
use crate::models::User;
use crate::services::SessionTokens;
use crate::AppState;

/// The refresh token travels only in this HttpOnly cookie, scoped to the auth
/// path prefix; it is never returned in a response body.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
const AUTH_COOKIE_PATH: &str = "/api/auth";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

impl RegisterRequest {
    /// Strip surrounding whitespace before validation so a padded email like
    /// `" A@X.com "` is judged on its trimmed form, matching the
    /// normalization the session layer applies before storage.
    fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl LoginRequest {
    fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub access_token: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn new(user: &User, tokens: &SessionTokens, config: &Config) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            access_token: tokens.access_token.clone(),
            expires_in: config.jwt.access_ttl_secs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
    pub revoked: u64,
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let payload = payload.normalized();
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (user, tokens) = state
        .auth
        .register(&payload.email, &payload.password, &payload.display_name)
        .await?;

    let jar = jar.add(refresh_cookie(&tokens.refresh_token, &state.config));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse::new(&user, &tokens, &state.config)),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let payload = payload.normalized();
    payload
        .validate()
        .map_err(|_| ApiError::InvalidCredentials)?;

    let (user, tokens) = state.auth.login(&payload.email, &payload.password).await?;

    let jar = jar.add(refresh_cookie(&tokens.refresh_token, &state.config));
    Ok((jar, Json(AuthResponse::new(&user, &tokens, &state.config))))
}

/// Rotate the session: burn the presented refresh value and hand back a new
/// access token plus a replacement refresh cookie. Any failure clears the
/// cookie so a browser client falls back to a clean login.
async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(value) = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
    else {
        let jar = jar.add(expired_refresh_cookie(&state.config));
        return (jar, ApiError::InvalidRefreshToken).into_response();
    };

    match state.auth.refresh(&value).await {
        Ok(session) => {
            let jar = jar.add(refresh_cookie(&session.tokens.refresh_token, &state.config));
            let body = Json(AuthResponse {
                user_id: session.user_id,
                email: session.email,
                display_name: session.display_name,
                access_token: session.tokens.access_token,
                expires_in: state.config.jwt.access_ttl_secs,
            });
            (jar, body).into_response()
        }
        Err(err) => {
            let jar = jar.add(expired_refresh_cookie(&state.config));
            (jar, err).into_response()
        }
    }
}

/// Revoke every active session of the caller. Works without a principal too:
/// the cookie is cleared either way and nothing is revoked.
async fn logout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let revoked = match user {
        Some(user) => state.auth.logout(user.id).await?,
        None => 0,
    };

    let jar = jar.add(expired_refresh_cookie(&state.config));
    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
            revoked,
        }),
    ))
}

fn refresh_cookie(value: &str, config: &Config) -> Cookie<'static> {
    build_refresh_cookie(
        value.to_string(),
        time::Duration::seconds(config.jwt.refresh_ttl_secs),
        config,
    )
}

/// Max-Age=0 tells the browser to drop the cookie immediately.
fn expired_refresh_cookie(config: &Config) -> Cookie<'static> {
    build_refresh_cookie(String::new(), time::Duration::seconds(0), config)
}

fn build_refresh_cookie(
    value: String,
    max_age: time::Duration,
    config: &Config,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_TOKEN_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_secure(config.cookie.secure);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path(AUTH_COOKIE_PATH);
    cookie.set_max_age(max_age);
    if let Some(domain) = &config.cookie.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CookieConfig, DatabaseConfig, JwtConfig, ServerConfig, SweepConfig};

    fn test_config(secure: bool) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                access_ttl_secs: 900,
                refresh_ttl_secs: 3600,
            },
            cookie: CookieConfig {
                secure,
                domain: None,
            },
            sweep: SweepConfig {
                interval_secs: 3600,
            },
        }
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc123", &test_config(true));
        assert_eq!(cookie.name(), REFRESH_TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some(AUTH_COOKIE_PATH));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = expired_refresh_cookie(&test_config(false));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_validation_rejects_bad_email() {
        let payload = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "Secret1".to_string(),
            display_name: "A".to_string(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_padded_login_email_survives_boundary_validation() {
        let payload = LoginRequest {
            email: " A@X.com ".to_string(),
            password: " Secret1 ".to_string(),
        }
        .normalized();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.email, "A@X.com");
    }

    #[test]
    fn test_padded_register_email_survives_boundary_validation() {
        let payload = RegisterRequest {
            email: "  alice@example.com\t".to_string(),
            password: "Secret1".to_string(),
            display_name: "Alice".to_string(),
        }
        .normalized();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.email, "alice@example.com");
    }

    #[test]
    fn test_validation_accepts_minimal_registration() {
        let payload = RegisterRequest {
            email: "a@x.com".to_string(),
            password: "Secret1".to_string(),
            display_name: "A".to_string(),
        };
        assert!(payload.validate().is_ok());
    }
}
