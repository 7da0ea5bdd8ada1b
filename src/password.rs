//! One-way password hashing.
//!
//! Wraps Argon2 with a random per-hash salt. The plaintext is never logged,
//! stored, or returned; a hashing failure surfaces as an internal error and
//! never downgrades to plaintext storage.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Hash a plaintext password into a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash. The comparison is
/// performed by Argon2's verifier, which recomputes the full digest rather
/// than short-circuiting on a prefix mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
