//! Password hashing and verification.
//!
//! Opaque facade over Argon2id: the rest of the crate treats credentials as
//! a one-way `hash`/`verify` capability and never sees algorithm details.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts come from `OsRng` (cryptographically secure RNG)
//! - Hashes are stored in PHC string format

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// Hashes a plaintext password for storage.
///
/// # Errors
/// Returns an `Internal` error if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash.
///
/// Returns `false` on mismatch and on any verification error, including a
/// malformed stored hash: a hash we cannot parse must never authenticate.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct-password").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("correct-password", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("correct-password").unwrap();
        let b = hash_password("correct-password").unwrap();
        assert_ne!(a, b);

        assert!(verify_password("correct-password", &a));
        assert!(verify_password("correct-password", &b));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }
}
