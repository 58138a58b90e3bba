//! Credentials: password hashing, bearer tokens and the request identity.

mod identity;
mod password;
mod token;

pub use identity::AuthUser;
pub use password::PasswordHasher;
pub use token::TokenSigner;

use thiserror::Error;

/// Failures of the credential primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid key length")]
    InvalidKey,
    #[error("malformed password hash")]
    MalformedHash,
    #[error("malformed token")]
    MalformedToken,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("credential task failed")]
    TaskFailed,
}
