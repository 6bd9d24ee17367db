//! Password storage. Accounts keep a salted hash, never the plaintext.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Invalid hashing parameters: {0}")]
    Params(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Hash-and-compare capability used for every password check.
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, SecretError>;

    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, SecretError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| SecretError::Params(e.to_string()))?;
        Ok(Argon2Hasher {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Argon2Hasher {
            argon2: Argon2::default(),
        }
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, SecretError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| SecretError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            log::warn!("Stored password hash could not be parsed");
            return false;
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}
