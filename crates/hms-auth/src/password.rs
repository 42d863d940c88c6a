//! Staff password hashing (Argon2id)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::warn;

use crate::error::AuthError;

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("failed to hash password: {0}")]
    HashingFailed(String),

    /// Verifier fault other than a plain mismatch
    #[error("failed to verify password: {0}")]
    VerificationFailed(String),

    /// Stored hash is not a readable PHC string
    #[error("invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

/// Hash a password into a PHC string suitable for storage
///
/// Argon2id with the crate defaults and a random 16-byte salt.
///
/// # Arguments
/// * `password` - The plain text password to hash
///
/// # Returns
/// * `Ok(String)` - PHC-formatted hash string
/// * `Err(PasswordError)` - If hashing fails
///
/// # Example
/// ```
/// use hms_auth::password::hash_password;
///
/// let hash = hash_password("hunter22").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check a password against a stored PHC hash
///
/// # Arguments
/// * `password` - The plain text password to verify
/// * `hash` - The PHC-formatted hash from the user store
///
/// # Returns
/// * `Ok(true)` - Password matches hash
/// * `Ok(false)` - Plain mismatch
/// * `Err(PasswordError)` - Unreadable hash or verifier fault
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Credential check used by the login flow
///
/// Collapses every failure into [`AuthError::AuthenticationFailed`] so a
/// caller cannot tell a wrong password from a corrupt stored hash. The
/// latter is logged.
pub fn authenticate(password: &str, hash: &str) -> Result<(), AuthError> {
    match verify_password(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::AuthenticationFailed),
        Err(e) => {
            warn!("Password check failed on stored hash: {}", e);
            Err(AuthError::AuthenticationFailed)
        }
    }
}

/// Run a full Argon2 verification against a throwaway hash
///
/// Login calls this for unknown usernames so the response takes as long as
/// a wrong-password attempt. The result is always discarded.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| hash_password("hms-unknown-account").ok())
        .as_deref()
}
