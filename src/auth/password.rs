//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt>$<digest>` with
//! base64 salt and digest, so the iteration count can be raised later
//! without invalidating existing hashes.

use super::CredentialError;
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::error;

const ALGORITHM: &str = "pbkdf2_sha256";

/// Salt length in bytes.
const SALT_LENGTH: usize = 16;

/// Derived key length, one SHA-256 block.
const DIGEST_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub const DEFAULT_ITERATIONS: u32 = 390_000;

    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);

        let digest = derive_key(password.as_bytes(), &salt, self.iterations);
        Ok(format!(
            "{}${}${}${}",
            ALGORITHM,
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(digest)
        ))
    }

    /// Check a password against an encoded hash.
    ///
    /// The iteration count stored in the hash wins over the configured one.
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, CredentialError> {
        let mut parts = encoded.split('$');
        let (Some(algorithm), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(CredentialError::MalformedHash);
        };

        if algorithm != ALGORITHM {
            return Err(CredentialError::MalformedHash);
        }
        let iterations: u32 = iterations.parse().map_err(|_| CredentialError::MalformedHash)?;
        if iterations == 0 {
            return Err(CredentialError::MalformedHash);
        }
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| CredentialError::MalformedHash)?;
        let expected = STANDARD_NO_PAD
            .decode(expected)
            .map_err(|_| CredentialError::MalformedHash)?;

        let digest = derive_key(password.as_bytes(), &salt, iterations);
        Ok(digest.as_slice().ct_eq(expected.as_slice()).into())
    }

    /// Runs [`hash`](Self::hash) on the blocking pool.
    pub async fn spawn_hash(&self, password: String) -> Result<String, CredentialError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing task panicked");
                CredentialError::TaskFailed
            })?
    }

    /// Runs [`verify`](Self::verify) on the blocking pool.
    pub async fn spawn_verify(&self, password: String, encoded: String) -> Result<bool, CredentialError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &encoded))
            .await
            .map_err(|e| {
                error!(error = %e, "Password verification task panicked");
                CredentialError::TaskFailed
            })?
    }
}

fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LENGTH] {
    let mut output = [0u8; DIGEST_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
    output
}
