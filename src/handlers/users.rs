use crate::auth::{AuthUser, PasswordHasher};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::permissions::ensure_owner;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::validation::normalize_email;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::{cascade, entities::user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a user or replacing all of its fields
#[derive(Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UserRequest {
    /// Display name
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::not_blank"),
        length(max = 20, message = "Ensure this field has no more than 20 characters.")
    )]
    pub username: Option<String>,
    /// Email address, used to log in (must be unique)
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::email_address")
    )]
    pub email: Option<String>,
    /// Password, at least 8 characters. Never returned.
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::password_strength")
    )]
    pub password: Option<String>,
}

/// Request body for a partial user update; absent fields are left alone
#[derive(Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchUserRequest {
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 20, message = "Ensure this field has no more than 20 characters.")
    )]
    pub username: Option<String>,
    #[validate(custom(function = "crate::validation::email_address"))]
    pub email: Option<String>,
    #[validate(custom(function = "crate::validation::password_strength"))]
    pub password: Option<String>,
}

/// User response model, the password hash is never part of it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validated field values to write onto a user row
struct UserChanges {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl From<UserRequest> for UserChanges {
    fn from(request: UserRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
        }
    }
}

impl From<PatchUserRequest> for UserChanges {
    fn from(request: PatchUserRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
        }
    }
}

impl UserChanges {
    /// Writes the present fields and returns their names.
    async fn apply(
        self,
        active: &mut user::ActiveModel,
        passwords: &PasswordHasher,
    ) -> Result<Vec<&'static str>, ApiError> {
        let mut updated = Vec::new();
        if let Some(username) = self.username {
            active.username = Set(username.trim().to_string());
            updated.push("username");
        }
        if let Some(email) = self.email {
            active.email = Set(normalize_email(&email));
            updated.push("email");
        }
        if let Some(password) = self.password {
            active.password_hash = Set(passwords.spawn_hash(password).await?);
            updated.push("password");
        }
        Ok(updated)
    }
}

fn email_conflict(err: sea_orm::DbErr) -> ApiError {
    ApiError::conflict_or_db(err, "EMAIL_ALREADY_EXISTS", "user with this email already exists.")
}

async fn find_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, ApiError> {
    match user::Entity::find_by_id(user_id).one(db).await? {
        Some(user) => Ok(user),
        None => {
            warn!("User with ID {} not found", user_id);
            Err(ApiError::NotFound("User"))
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");
    request.validate()?;

    let mut new_user = user::ActiveModel {
        is_active: Set(true),
        is_staff: Set(false),
        ..Default::default()
    };
    UserChanges::from(request)
        .apply(&mut new_user, &state.passwords)
        .await?;

    trace!("Attempting to insert new user into database");
    let user_model = new_user.insert(&state.db).await.map_err(email_conflict)?;

    info!("User created successfully with ID: {}, username: {}", user_model.id, user_model.username);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserResponse::from(user_model), "User created successfully")),
    ))
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/login_user",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_login_user(identity: AuthUser) -> Json<ApiResponse<UserResponse>> {
    debug!("Returning login user {}", identity.id());
    Json(ApiResponse::new(
        UserResponse::from(identity.into_user()),
        "User retrieved successfully",
    ))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    _identity: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering get_user function for user_id: {}", user_id);
    let user_model = find_user(&state.db, user_id).await?;

    debug!("Retrieved user with ID: {}, username: {}", user_model.id, user_model.username);
    Ok(Json(ApiResponse::new(
        UserResponse::from(user_model),
        "User retrieved successfully",
    )))
}

/// Replace every field of a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_user(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);
    let existing_user = find_user(&state.db, user_id).await?;
    ensure_owner(&existing_user, &identity)?;
    request.validate()?;

    save_user(&state, existing_user, request.into()).await
}

/// Update some fields of a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = PatchUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn partial_update_user(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PatchUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering partial_update_user function for user_id: {}", user_id);
    let existing_user = find_user(&state.db, user_id).await?;
    ensure_owner(&existing_user, &identity)?;
    request.validate()?;

    save_user(&state, existing_user, request.into()).await
}

async fn save_user(
    state: &AppState,
    existing_user: user::Model,
    changes: UserChanges,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_id = existing_user.id;
    let mut user_active: user::ActiveModel = existing_user.into();
    let updated_fields = changes.apply(&mut user_active, &state.passwords).await?;

    if updated_fields.is_empty() {
        debug!("No fields to update for user ID: {}", user_id);
    } else {
        debug!("Updating fields: {}", updated_fields.join(", "));
    }

    trace!("Attempting to update user in database");
    let updated_user = user_active.update(&state.db).await.map_err(email_conflict)?;

    info!("User with ID {} updated successfully", user_id);
    Ok(Json(ApiResponse::new(
        UserResponse::from(updated_user),
        "User updated successfully",
    )))
}

/// Delete a user together with everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    ApiPath(user_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);
    let existing_user = find_user(&state.db, user_id).await?;
    ensure_owner(&existing_user, &identity)?;

    let summary = cascade::delete_user(&state.db, user_id).await?;
    info!(
        "User with ID {} deleted with {} profile(s), {} phrase(s), {} comment(s)",
        user_id, summary.profiles, summary.phrases, summary.comments
    );
    Ok(StatusCode::NO_CONTENT)
}
