use crate::error::ApiError;
use crate::schemas::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use model::entities::user;
use sea_orm::EntityTrait;
use std::fmt;
use tracing::{debug, trace};

const BEARER_PREFIX: &str = "Bearer ";

/// The authenticated caller of a request.
///
/// Taking this extractor makes a handler reject anonymous requests with 401.
#[derive(Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }

    pub fn into_user(self) -> user::Model {
        self.0
    }
}

// Keeps the password hash out of spans and logs
impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("id", &self.0.id)
            .field("email", &self.0.email)
            .finish()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::NotAuthenticated)?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::InvalidToken)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            ApiError::InvalidToken
        })?;

        trace!("Resolving user {} from bearer token", claims.sub);
        match user::Entity::find_by_id(claims.sub).one(&state.db).await? {
            Some(user) if user.is_active => Ok(AuthUser(user)),
            Some(_) => {
                debug!("User {} is inactive", claims.sub);
                Err(ApiError::InvalidToken)
            }
            None => {
                debug!("User {} from token no longer exists", claims.sub);
                Err(ApiError::InvalidToken)
            }
        }
    }
}
