//! Argon2id password hashing and the single credential-setting contract.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

/// Shortest password accepted anywhere a credential is set.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn password_hasher() -> Argon2<'static> {
    // Argon2id with moderate memory and a single iteration keeps interactive
    // logins fast while retaining side-channel protections.
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .expect("valid Argon2 parameters");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| Error::internal(format!("Failed to hash password: {}", err)))?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC string.
///
/// The digest comparison inside `argon2` is constant-time. An unparseable
/// stored hash is an internal error, a mismatch is `Ok(false)`.
pub fn verify_password(candidate: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| Error::internal(format!("Invalid password hash: {}", err)))?;
    Ok(password_hasher().verify_password(candidate.as_bytes(), &parsed).is_ok())
}

/// Enforce the password length contract.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation_field(
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            "password",
        ));
    }
    Ok(())
}

/// Validate and hash a new credential.
///
/// Every path that sets a password (account creation, admin reset,
/// self-service change, bootstrap) goes through here.
pub fn prepare_credential(password: &str) -> Result<String> {
    validate_password(password)?;
    hash_password(password)
}
