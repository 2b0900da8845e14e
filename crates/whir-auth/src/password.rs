//! Password hashing with bcrypt.

use crate::error::{AuthError, Result};

#[cfg(debug_assertions)]
const HASH_COST: u32 = 4;
#[cfg(not(debug_assertions))]
const HASH_COST: u32 = 12;

/// Hash a password. CPU-heavy; call from a blocking context.
///
/// # Errors
///
/// Returns `AuthError::Internal` if bcrypt fails.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, HASH_COST)
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored hash. A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
