//! Salted password hashing.
//!
//! Argon2id with a fresh random salt per call. Hashing is isolated here so
//! the algorithm can be swapped without touching the gateway. A mismatching
//! password is a `false` from [`verify`], never an error.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;

/// Hash a plaintext password, embedding a random salt in the PHC string.
///
/// # Errors
/// Returns an error if the hashing primitive itself fails (never on any
/// particular password value).
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("Error hashing password: {e}"))?;

    Ok(digest.to_string())
}

/// Check a plaintext password against a PHC digest.
///
/// Comparison happens inside the argon2 verifier, which is constant-time over
/// the digest. An unparsable digest verifies as `false`.
#[must_use]
pub fn verify(plaintext: &str, digest: &str) -> bool {
    PasswordHash::new(digest).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let digest = hash("admin").unwrap();
        assert!(verify("admin", &digest));
        assert!(!verify("wrong", &digest));
    }

    #[test]
    fn test_salted_digests_differ() {
        let first = hash("hunter2").unwrap();
        let second = hash("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(verify("hunter2", &first));
        assert!(verify("hunter2", &second));
    }

    #[test]
    fn test_garbage_digest_is_false() {
        assert!(!verify("admin", "not a phc string"));
        assert!(!verify("admin", ""));
    }
}
