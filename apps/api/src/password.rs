//! # Password Hashing
//!
//! Argon2id with the crate's default cost parameters and a random salt per
//! hash. Hashes are stored in PHC string form, so the parameters travel with
//! the hash.
//!
//! Both operations are CPU-bound and run on the blocking thread pool.
//!
//! A login for an unknown email still pays for one verification, against a
//! hash of a throwaway password, so response time does not reveal which
//! emails have accounts.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use tokio::sync::OnceCell;
use tokio::task;

use crate::error::ApiError;

/// Hash a password for storage.
pub fn hash_password_blocking(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash.
///
/// A hash that cannot be parsed is an internal error, not a mismatch.
pub fn verify_password_blocking(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::internal(format!("Stored password hash is invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn hash_password(password: String) -> Result<String, ApiError> {
    task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?
}

pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, ApiError> {
    task::spawn_blocking(move || verify_password_blocking(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::internal(format!("Verification task failed: {}", e)))?
}

/// Hashed on first use with the same parameters as real accounts.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Verifies `password` against the throwaway hash. Always `false`.
pub async fn verify_dummy_password(password: String) -> Result<bool, ApiError> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_password("mesa-no-such-account".to_string()))
        .await?;
    verify_password(password, hash.clone()).await
}
