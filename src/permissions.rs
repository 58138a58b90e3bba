//! Ownership permission gate.
//!
//! Anyone authenticated may read; only the owner of a resource may update or
//! delete it. A user record is owned by that user.

use crate::auth::AuthUser;
use crate::error::ApiError;
use model::entities::{comment, phrase, profile, user};
use tracing::warn;

/// A resource that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

impl Owned for user::Model {
    fn owner_id(&self) -> i32 {
        self.id
    }
}

impl Owned for profile::Model {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

impl Owned for phrase::Model {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

impl Owned for comment::Model {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

/// Fails with [`ApiError::PermissionDenied`] unless `identity` owns `resource`.
pub fn ensure_owner<T: Owned>(resource: &T, identity: &AuthUser) -> Result<(), ApiError> {
    if resource.owner_id() == identity.id() {
        return Ok(());
    }
    warn!(
        "User {} attempted to modify a resource owned by user {}",
        identity.id(),
        resource.owner_id()
    );
    Err(ApiError::PermissionDenied)
}
