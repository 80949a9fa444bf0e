use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use thiserror::Error;

const ARGON2_MEMORY: u32 = 19 * 1024; // 19 MiB
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Digest verified against when an account has no digest of its own, so a
/// lookup miss costs the same as a wrong password.
static ABSENT_DIGEST: LazyLock<String> = LazyLock::new(|| {
    CredentialHasher::new()
        .hash("folio-absent-account")
        .unwrap_or_default()
});

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// One-way password hashing with Argon2id and a per-call random salt.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .expect("invalid argon2 params");

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes a plaintext password into a PHC string with the salt embedded.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored digest.
    ///
    /// The digest comparison is constant-time. A digest that does not parse
    /// is a mismatch, not an error.
    #[must_use]
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!("Stored password digest is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Does the work of a full verification and reports a mismatch. Call it
    /// when there is no stored digest to verify against.
    #[must_use]
    pub fn verify_absent(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &ABSENT_DIGEST);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_correct_password() {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("correct horse battery staple").unwrap();

        assert!(hasher.verify("correct horse battery staple", &digest));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("hunter22").unwrap();

        assert!(!hasher.verify("hunter23", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = CredentialHasher::new();
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same-password", &first));
        assert!(hasher.verify("same-password", &second));
    }

    #[test]
    fn test_hash_is_phc_format() {
        let hasher = CredentialHasher::new();
        let digest = hasher.hash("password").unwrap();

        assert!(digest.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_digest_is_a_mismatch() {
        let hasher = CredentialHasher::new();

        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("password", "not-a-hash"));
        assert!(!hasher.verify("password", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn test_absent_digest_costs_a_full_verify() {
        let hasher = CredentialHasher::new();
        let live = hasher.hash("password").unwrap();
        let live = Params::try_from(&PasswordHash::new(&live).unwrap()).unwrap();

        let absent = PasswordHash::new(&ABSENT_DIGEST).unwrap();
        assert_eq!(absent.algorithm, Algorithm::Argon2id.ident());
        let absent = Params::try_from(&absent).unwrap();
        assert_eq!(absent.m_cost(), live.m_cost());
        assert_eq!(absent.t_cost(), live.t_cost());
        assert_eq!(absent.p_cost(), live.p_cost());
        assert_eq!(absent.output_len(), live.output_len());

        assert!(!hasher.verify_absent("password"));
        assert!(!hasher.verify_absent("folio-absent-account"));
    }
}
