//! One-way hashing for passwords and refresh tokens
//!
//! Argon2id is CPU and memory bound, so every hash and verify runs on the
//! blocking pool rather than on an executor thread.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashingConfig;
use crate::error::{IdentityError, Result};

/// Argon2id hasher with fixed cost parameters
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Build a hasher from cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHashingParams` when Argon2 rejects the parameters.
    pub fn new(config: &HashingConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| IdentityError::InvalidHashingParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret with a fresh random salt, returning the PHC string.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails or the blocking task is cancelled.
    pub async fn hash(&self, secret: &str) -> Result<String> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| IdentityError::HashingError(e.to_string()))
        })
        .await
        .map_err(|e| IdentityError::TaskFailed(e.to_string()))?
    }

    /// Check a secret against a stored PHC string.
    ///
    /// The cost parameters embedded in the stored hash are used, so hashes
    /// produced under an older configuration still verify.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` if the stored value cannot be parsed.
    pub async fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored_hash).map_err(|_| IdentityError::MalformedHash)?;
            match argon2.verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(IdentityError::HashingError(e.to_string())),
            }
        })
        .await
        .map_err(|e| IdentityError::TaskFailed(e.to_string()))?
    }
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}
