use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Argon2id hash in PHC string form, with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

/// A stored hash that cannot be parsed never matches.
pub fn password_matches(plain: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_match() {
        let hash = hash_password("Password123!").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(password_matches("Password123!", &hash));
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("Password123!").expect("hashing should succeed");
        assert!(!password_matches("password123!", &hash));
    }

    #[test]
    fn malformed_hash_does_not_match() {
        assert!(!password_matches("anything", "not-a-valid-hash"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }
}
