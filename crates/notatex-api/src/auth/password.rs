//! Password hashing (bcrypt).

use std::sync::LazyLock;

use bcrypt::{hash_with_salt, DEFAULT_COST};
use notatex_core::AppError;

/// Hash a password with a fresh random salt, returning (hash, salt). Both
/// are stored together on the account; the salt is also embedded in the
/// bcrypt hash itself.
pub fn hash_password(password: &str) -> Result<(String, String), AppError> {
    use rand::Rng;

    let salt: [u8; 16] = rand::rng().random();
    let parts = hash_with_salt(password.as_bytes(), DEFAULT_COST, salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok((parts.to_string(), hex::encode(salt)))
}

/// Verify a password against a stored bcrypt hash. The bcrypt work factor
/// dominates timing; there is no data-dependent short-circuit.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password.as_bytes(), hash).unwrap_or(false)
}

// Fixed hash for the unknown-username path of authentication, so both
// failure paths pay the same bcrypt cost.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| bcrypt::hash("notatex.dummy.password", DEFAULT_COST).unwrap_or_default());

/// Run a verification against the fixed dummy hash and discard the result.
pub fn burn_password_check(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let (hash, salt) = hash_password("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$2"));
        assert_eq!(salt.len(), 32); // 16 bytes hex-encoded
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_use_fresh_salts() {
        let (hash_a, salt_a) = hash_password("same password").unwrap();
        let (hash_b, salt_b) = hash_password("same password").unwrap();

        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not a bcrypt hash"));
    }

    #[test]
    fn test_burn_password_check_does_not_panic() {
        burn_password_check("whatever");
    }
}
