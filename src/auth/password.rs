use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::ApiError;

/// Hash a password into a PHC string (`$argon2id$v=19$…`).
pub fn hash(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::internal("failed to process password")
        })
}

/// Verify a password against a stored PHC string. Returns false on mismatch;
/// an unparseable stored hash is an internal error, not a mismatch.
pub fn verify(plain: &str, phc: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(phc).map_err(|e| {
        tracing::error!("stored password hash is malformed: {}", e);
        ApiError::internal("failed to process password")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
