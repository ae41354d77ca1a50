//! Argon2id password hashing.
//!
//! The cost parameters are the `argon2` crate defaults and are not
//! configurable. Hashes are stored in PHC string format, so the salt and
//! parameters travel with each hash.

use super::StoreError;
use argon2::{
    password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::sync::OnceLock;

static DECOY_HASH: OnceLock<String> = OnceLock::new();

/// Hash a plaintext password with a fresh random salt.
///
/// # Errors
/// Returns `StoreError::Hash` if the hasher rejects the input.
pub fn hash(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// Verify `candidate` against a stored PHC hash.
///
/// # Errors
/// `StoreError::InvalidCredentials` on mismatch, `StoreError::Hash` when the
/// stored hash cannot be parsed.
pub fn verify(hash: &str, candidate: &str) -> Result<(), StoreError> {
    let parsed = PasswordHash::new(hash).map_err(|e| StoreError::Hash(e.to_string()))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(HashError::Password) => Err(StoreError::InvalidCredentials),
        Err(e) => Err(StoreError::Hash(e.to_string())),
    }
}

/// Hash of a random password nobody knows.
///
/// Unknown-email logins verify against it so they cost the same as a wrong
/// password. Returns an empty string if hashing failed, which `verify`
/// rejects as malformed.
pub fn decoy_hash() -> &'static str {
    DECOY_HASH.get_or_init(|| {
        let secret: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        hash(&secret).unwrap_or_default()
    })
}
