//! # Password hashing and verification: Argon2id
//!
//! - [`hash_password`] generates a random salt via [`OsRng`], hashes the plaintext with
//!   the default Argon2id parameters and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`), stored in `users.password_hash`.
//! - [`verify_password`] parses a PHC string and checks the plaintext against it:
//!   `Ok(true)` on match, `Ok(false)` on mismatch, `Err` if the stored hash is corrupt.
//! - [`verify_against_dummy`] spends the same work as a real verification. Login calls
//!   it for unknown emails so response timing does not reveal which accounts exist.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::ApiError;

static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dummy-password-for-timing").ok());

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}
