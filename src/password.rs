//! Password hashing and verification.

use argon2::Config;
use rand::{rngs::OsRng, RngCore};

use crate::types::HashedPassword;

const SALT_BYTES: usize = 16;

/// Hash a password with argon2 under a fresh random salt. Two calls with the
/// same plaintext produce different encodings, so stored hashes cannot be
/// compared to detect password reuse.
pub fn hash_password(plain: &str) -> Result<HashedPassword, argon2::Error> {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);

    let encoded = argon2::hash_encoded(plain.as_bytes(), &salt, &Config::default())?;

    Ok(HashedPassword(encoded))
}

/// Verify a password against a stored hash, using the salt and parameters
/// embedded in the encoding. A malformed stored hash verifies as `false`.
pub fn verify_password(plain: &str, hashed: &HashedPassword) -> bool {
    argon2::verify_encoded(&hashed.0, plain.as_bytes()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let hashed = hash_password("correct horse battery staple").unwrap();

        assert!(verify_password("correct horse battery staple", &hashed));
        assert!(!verify_password("incorrect horse", &hashed));
    }

    #[test]
    fn salts_are_unique_per_hash() {
        let first = hash_password("hunter2hunter2").unwrap();
        let second = hash_password("hunter2hunter2").unwrap();

        assert_ne!(first.0, second.0);
        assert!(verify_password("hunter2hunter2", &first));
        assert!(verify_password("hunter2hunter2", &second));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        let garbage = HashedPassword("not an encoded hash".into());
        assert!(!verify_password("anything", &garbage));
    }
}
