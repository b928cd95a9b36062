//! Password hashing with Argon2id.
//!
//! Produces salted PHC-format hashes, so the same plaintext yields a
//! different hash on every call. Verification never fails with an error on
//! mismatch; a malformed stored hash is also reported as a mismatch.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

use crate::errors::{AuthError, ServiceResult};

/// Hash a plaintext password using Argon2id with a fresh random salt.
///
/// Returns the PHC string format hash that includes algorithm parameters.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `false` on mismatch and on an undecodable stored hash; the only
/// observable outcome of a bad credential is "verification failed".
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Run a verification against a fixed throwaway hash.
///
/// Used on the unknown-identifier login path so it stays in the same timing
/// class as a wrong-password verification (enumeration resistance).
pub fn dummy_verify(password: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| {
        hash_password("dummy-password-for-timing").unwrap_or_default()
    });

    let _ = verify_password(password, hash);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct-pw").unwrap();

        assert!(verify_password("correct-pw", &hash));
        assert!(!verify_password("wrong-pw", &hash));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("correct-pw").unwrap();
        let second = hash_password("correct-pw").unwrap();

        // Fresh salt per call
        assert_ne!(first, second);
        assert!(verify_password("correct-pw", &first));
        assert!(verify_password("correct-pw", &second));
    }

    #[test]
    fn test_malformed_stored_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-phc-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_dummy_verify_does_not_panic() {
        dummy_verify("whatever");
        dummy_verify("");
    }
}
