//! Principal resolution: map a bearer credential on the request to a user
//! identity. Stateless by design; the claims carry everything downstream
//! handlers need, so no store lookup happens per request.

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// A verified principal. Rejects with `Unauthenticated` when no credential is
/// presented, or with the signer's `TokenExpired`/`TokenInvalid` when one is
/// presented but does not verify.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| access_token_cookie(parts))
            .ok_or(ApiError::Unauthenticated)?;

        let (id, email) = state.signer.verify_access_token(&token)?;
        Ok(CurrentUser { id, email })
    }
}

/// An optional principal: never rejects, handlers decide whether anonymous is
/// acceptable.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            CurrentUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// API clients send the token in the Authorization header; browser clients
/// fall back to the HttpOnly cookie.
fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn access_token_cookie(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_from_header() {
        let parts = parts_with_headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let parts = parts_with_headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(bearer_token(&parts).is_none());
    }

    #[test]
    fn test_access_token_from_cookie() {
        let parts = parts_with_headers(&[("cookie", "access_token=tok123; other=x")]);
        assert_eq!(access_token_cookie(&parts).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_no_credential() {
        let parts = parts_with_headers(&[]);
        assert!(bearer_token(&parts).is_none());
        assert!(access_token_cookie(&parts).is_none());
    }
}
