use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::validation::normalize_email;
use axum::{extract::State, response::Json};
use model::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Login credentials
#[derive(Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct TokenRequest {
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::not_blank")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::not_blank")
    )]
    pub password: Option<String>,
}

/// Issued bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Value for the `Authorization: Bearer` header
    pub access: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Wrong credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    trace!("Entering obtain_token function");
    request.validate()?;

    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(ApiError::InvalidCredentials);
    };
    let email = normalize_email(&email);

    debug!("Looking up account for token request");
    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?;

    let account = match account {
        Some(account) if account.is_active => account,
        _ => {
            warn!("Token request for unknown or inactive account");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !state
        .passwords
        .spawn_verify(password, account.password_hash.clone())
        .await?
    {
        warn!("Wrong password for user {}", account.id);
        return Err(ApiError::InvalidCredentials);
    }

    let access = state.tokens.issue(account.id)?;
    info!("Issued token for user {}", account.id);
    Ok(Json(ApiResponse::new(
        TokenResponse {
            access,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens.ttl().as_secs(),
        },
        "Token issued successfully",
    )))
}
