use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{UserError, UserResult};

/// Opaque credential-hashing capability.
///
/// The pipeline and service never see hashing internals; swapping the
/// algorithm means swapping the implementation behind this trait.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> UserResult<String>;
    fn verify(&self, plaintext: &str, hash: &str) -> UserResult<bool>;
}

/// Argon2-backed implementation used in production.
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hasher = Argon2Hasher;

        let hash = hasher.hash("correct horse").unwrap();
        assert_ne!(hash, "correct horse");

        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = Argon2Hasher;
        assert!(hasher.verify("anything", "not-a-phc-string").is_err());
    }
}
