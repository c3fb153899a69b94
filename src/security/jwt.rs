//! Access-token signing and verification.
//!
//! Access tokens are self-contained HS256 assertions: validity is decided by
//! signature and expiry alone, with no store lookup. Refresh tokens are the
//! opposite: opaque random values whose state lives in the database.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{ApiError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Holds the process-wide signing key, built once at startup from config.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(config: &JwtConfig) -> Self {
        // Pin HS256 so tokens signed with any other algorithm are rejected
        // outright. Zero leeway keeps expiry exact.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            validation,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        self.issue_access_token_at(user_id, email, Utc::now())
    }

    pub(crate) fn issue_access_token_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign access token: {e}")))
    }

    /// Verify signature and expiry, returning the subject and email claims.
    /// An expiry-only failure maps to `TokenExpired`; anything else (bad
    /// signature, malformed structure, unexpected algorithm) is `TokenInvalid`.
    pub fn verify_access_token(&self, token: &str) -> Result<(Uuid, String)> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::TokenInvalid,
            })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::TokenInvalid)?;
        Ok((user_id, data.claims.email))
    }

    /// Generate an opaque refresh-token value: 32 CSPRNG bytes, hex-encoded.
    /// Never parsed or trusted for claims, only used as a store key.
    pub fn issue_refresh_value(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&JwtConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
        })
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let token = signer.issue_access_token(user_id, "a@x.com").unwrap();

        let (verified_id, email) = signer.verify_access_token(&token).unwrap();
        assert_eq!(verified_id, user_id);
        assert_eq!(email, "a@x.com");
    }

    #[test]
    fn test_expired_token_maps_to_token_expired() {
        let signer = signer();
        let issued_at = Utc::now() - Duration::seconds(901);
        let token = signer
            .issue_access_token_at(Uuid::new_v4(), "a@x.com", issued_at)
            .unwrap();

        let err = signer.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, ApiError::TokenExpired));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let signer = signer();
        let token = signer
            .issue_access_token(Uuid::new_v4(), "a@x.com")
            .unwrap();

        // Flip a byte in the payload segment.
        let mut bytes = token.into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let err = signer.verify_access_token(&tampered).unwrap_err();
        assert!(matches!(err, ApiError::TokenInvalid));
    }

    #[test]
    fn test_token_from_other_key_is_invalid() {
        let signer = signer();
        let other = TokenSigner::new(&JwtConfig {
            secret: "a-different-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
        });
        let token = other.issue_access_token(Uuid::new_v4(), "a@x.com").unwrap();

        let err = signer.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, ApiError::TokenInvalid));
    }

    #[test]
    fn test_token_with_other_algorithm_is_rejected() {
        let signer = signer();
        let claims = AccessTokenClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@x.com".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::seconds(900)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        let err = signer.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, ApiError::TokenInvalid));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let err = signer().verify_access_token("not.a.jwt").unwrap_err();
        assert!(matches!(err, ApiError::TokenInvalid));
    }

    #[test]
    fn test_refresh_values_are_unique_and_long() {
        let signer = signer();
        let a = signer.issue_refresh_value();
        let b = signer.issue_refresh_value();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64); // 32 bytes hex-encoded
    }
}
