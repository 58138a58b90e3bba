//! Signed bearer tokens.
//!
//! A token is `base64url(claims json) "." base64url(HMAC-SHA256)`. Tokens are
//! stateless: the signature and the expiry are the only checks, the user row
//! is looked up by the identity extractor afterwards.

use super::CredentialError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated keys in bytes.
const KEY_LENGTH: usize = 32;

/// Payload carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    /// Expiry, unix seconds
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<[u8]>,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: Arc::from(secret.as_ref()),
            ttl,
        }
    }

    /// Signer with a random key; tokens do not survive a restart.
    pub fn with_random_key(ttl: Duration) -> Self {
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i32) -> Result<String, CredentialError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        self.verify_at(token, Utc::now())
    }

    fn issue_at(&self, user_id: i32, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let claims = Claims {
            sub: user_id,
            exp: now.timestamp() + self.ttl.as_secs() as i64,
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| CredentialError::MalformedToken)?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let signature = self.sign(payload.as_bytes())?;
        Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature)))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, CredentialError> {
        let (payload, signature) = token.split_once('.').ok_or(CredentialError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialError::MalformedToken)?;

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| CredentialError::InvalidKey)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CredentialError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CredentialError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| CredentialError::MalformedToken)?;

        if claims.exp <= now.timestamp() {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CredentialError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| CredentialError::InvalidKey)?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
