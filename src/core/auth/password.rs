//! Password hashing and verification using bcrypt.
//!
//! bcrypt salts every hash itself, so two hashes of the same password never
//! match, and its verify is constant-time with respect to where a mismatch
//! occurs. Both operations are CPU-bound and run on the blocking thread pool
//! so they cannot stall unrelated request handling.

use tokio::task;

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

/// Password hashing error types
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password hashing task failed to complete")]
    Join,
}

/// Hash a plaintext password with a fresh random salt.
///
/// The plaintext is moved onto the blocking pool and dropped there; it is
/// never logged and never stored.
pub async fn hash(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();

    task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|_| PasswordError::Join)?
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored bcrypt hash.
pub async fn verify(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();

    task::spawn_blocking(move || bcrypt::verify(password, &stored_hash))
        .await
        .map_err(|_| PasswordError::Join)?
        .map_err(|e| PasswordError::Hash(e.to_string()))
}
