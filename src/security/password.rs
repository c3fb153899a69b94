//! Password hashing and verification using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{ApiError, Result};

/// Hash a password for storage. Expects an already-normalized (trimmed) input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash. A mismatch is reported as
/// `InvalidCredentials`, indistinguishable from an unknown account.
pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash is invalid: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredentials)
}
