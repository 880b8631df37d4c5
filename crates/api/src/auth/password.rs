//! Password hashing and verification (Argon2id)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Well-formed Argon2id hash that no password maps to. Verifying against it
/// costs the same as a real check, so unknown usernames take as long to
/// reject as wrong passwords.
pub const IMPOSSIBLE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$QMTDpzUtykIjE45UGPoiEQ$UmlohffAy6jLrxI4q0yVd0cuk0Yyzm6smfMCFPluiyQ";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash a password into a PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a password against a stored PHC hash.
///
/// `Ok(false)` means the password does not match. Errors are reserved for
/// hashes that cannot be parsed or evaluated.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

/// Cheap Argon2 parameters so tests don't spend seconds per hash
#[cfg(test)]
pub(crate) fn hash_password_for_tests(password: &str) -> String {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}
