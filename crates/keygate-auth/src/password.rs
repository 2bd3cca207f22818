//! Password hashing and verification.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format
//! - A dummy verification path keeps login timing uniform for unknown
//!   usernames

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for secure storage using Argon2id.
///
/// Uses a cryptographically secure random salt and the crate's default
/// memory/time/parallelism parameters.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
///
/// # Example
///
/// ```
/// use keygate_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_secure_password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("my_secure_password", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it doesn't.
/// Returns `Err` only if the hash format is invalid.
///
/// # Example
///
/// ```
/// use keygate_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(verify_password("correct horse", &hash).unwrap());
/// assert!(!verify_password("wrong horse", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Perform the same Argon2 work as a real verification without a stored hash.
///
/// Called on login when the username does not exist, so the response takes
/// as long as a failed password check and timing does not reveal which
/// usernames are registered. The result is always discarded.
pub fn verify_password_dummy(password: &str) {
    let salt = SaltString::generate(&mut OsRng);
    let _ = Argon2::default().hash_password(password.as_bytes(), &salt);
}
