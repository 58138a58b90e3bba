use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::permissions::ensure_owner;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListQuery};
use crate::validation::parse_date;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::{Sex, profile, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

const PROFILE_EXISTS: &str = "profile for this user already exists.";

/// Request body for creating a profile or replacing all of its fields
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct ProfileRequest {
    /// One of `men`, `women`, `another`
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::sex_choice")
    )]
    pub sex: Option<String>,
    /// Date in `YYYY-MM-DD` format
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::iso_date")
    )]
    pub date_of_birth: Option<String>,
}

/// Request body for a partial profile update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchProfileRequest {
    #[validate(custom(function = "crate::validation::sex_choice"))]
    pub sex: Option<String>,
    #[validate(custom(function = "crate::validation::iso_date"))]
    pub date_of_birth: Option<String>,
}

/// Profile response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    /// Owning user id
    pub user: i32,
    /// Owning user's username
    pub username: String,
    pub sex: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn new(model: profile::Model, username: String) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            username,
            sex: model.sex.code(),
            date_of_birth: model.date_of_birth,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

struct ProfileChanges {
    sex: Option<Sex>,
    date_of_birth: Option<NaiveDate>,
}

impl From<ProfileRequest> for ProfileChanges {
    fn from(request: ProfileRequest) -> Self {
        Self {
            sex: request.sex.as_deref().and_then(Sex::from_code),
            date_of_birth: request.date_of_birth.as_deref().and_then(parse_date),
        }
    }
}

impl From<PatchProfileRequest> for ProfileChanges {
    fn from(request: PatchProfileRequest) -> Self {
        Self {
            sex: request.sex.as_deref().and_then(Sex::from_code),
            date_of_birth: request.date_of_birth.as_deref().and_then(parse_date),
        }
    }
}

impl ProfileChanges {
    fn apply(self, active: &mut profile::ActiveModel) -> Vec<&'static str> {
        let mut updated = Vec::new();
        if let Some(sex) = self.sex {
            active.sex = Set(sex);
            updated.push("sex");
        }
        if let Some(date_of_birth) = self.date_of_birth {
            active.date_of_birth = Set(date_of_birth);
            updated.push("date_of_birth");
        }
        updated
    }
}

async fn find_profile(db: &DatabaseConnection, profile_id: i32) -> Result<profile::Model, ApiError> {
    match profile::Entity::find_by_id(profile_id).one(db).await? {
        Some(profile) => Ok(profile),
        None => {
            warn!("Profile with ID {} not found", profile_id);
            Err(ApiError::NotFound("Profile"))
        }
    }
}

/// Create the caller's profile
#[utoipa::path(
    post,
    path = "/api/v1/profiles",
    tag = "profiles",
    security(("bearer" = [])),
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Profile created successfully", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 409, description = "Caller already has a profile", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_profile(
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProfileResponse>>), ApiError> {
    trace!("Entering create_profile function for user {}", identity.id());
    request.validate()?;

    let existing = profile::Entity::find()
        .filter(profile::Column::UserId.eq(identity.id()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        warn!("User {} already has a profile", identity.id());
        return Err(ApiError::Conflict {
            code: "PROFILE_ALREADY_EXISTS",
            message: PROFILE_EXISTS.to_string(),
        });
    }

    let mut new_profile = profile::ActiveModel {
        user_id: Set(identity.id()),
        ..Default::default()
    };
    ProfileChanges::from(request).apply(&mut new_profile);

    let profile_model = new_profile
        .insert(&state.db)
        .await
        .map_err(|e| ApiError::conflict_or_db(e, "PROFILE_ALREADY_EXISTS", PROFILE_EXISTS))?;

    info!("Profile created successfully with ID: {} for user {}", profile_model.id, identity.id());
    let username = identity.into_user().username;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ProfileResponse::new(profile_model, username),
            "Profile created successfully",
        )),
    ))
}

/// List profiles
#[utoipa::path(
    get,
    path = "/api/v1/profiles",
    tag = "profiles",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Profiles retrieved successfully", body = ApiResponse<Vec<ProfileResponse>>),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profiles(
    State(state): State<AppState>,
    _identity: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>, ApiError> {
    trace!("Entering get_profiles function");
    let rows = profile::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(profile::Column::Id)
        .offset(query.offset())
        .limit(query.page_size())
        .all(&state.db)
        .await?;

    let profiles: Vec<ProfileResponse> = rows
        .into_iter()
        .map(|(profile, owner)| {
            let username = owner.map(|owner| owner.username).unwrap_or_default();
            ProfileResponse::new(profile, username)
        })
        .collect();

    debug!("Retrieved {} profiles", profiles.len());
    Ok(Json(ApiResponse::new(profiles, "Profiles retrieved successfully")))
}

/// Get a specific profile by ID
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{profile_id}",
    tag = "profiles",
    security(("bearer" = [])),
    params(
        ("profile_id" = i32, Path, description = "Profile ID"),
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    ApiPath(profile_id): ApiPath<i32>,
    State(state): State<AppState>,
    _identity: AuthUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering get_profile function for profile_id: {}", profile_id);
    let row = profile::Entity::find_by_id(profile_id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?;

    match row {
        Some((profile, owner)) => {
            let username = owner.map(|owner| owner.username).unwrap_or_default();
            Ok(Json(ApiResponse::new(
                ProfileResponse::new(profile, username),
                "Profile retrieved successfully",
            )))
        }
        None => {
            warn!("Profile with ID {} not found", profile_id);
            Err(ApiError::NotFound("Profile"))
        }
    }
}

/// Replace every field of a profile
#[utoipa::path(
    put,
    path = "/api/v1/profiles/{profile_id}",
    tag = "profiles",
    security(("bearer" = [])),
    params(
        ("profile_id" = i32, Path, description = "Profile ID"),
    ),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_profile(
    ApiPath(profile_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering update_profile function for profile_id: {}", profile_id);
    let existing = find_profile(&state.db, profile_id).await?;
    ensure_owner(&existing, &identity)?;
    request.validate()?;

    save_profile(&state.db, existing, identity, request.into()).await
}

/// Update some fields of a profile
#[utoipa::path(
    patch,
    path = "/api/v1/profiles/{profile_id}",
    tag = "profiles",
    security(("bearer" = [])),
    params(
        ("profile_id" = i32, Path, description = "Profile ID"),
    ),
    request_body = PatchProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn partial_update_profile(
    ApiPath(profile_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PatchProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    trace!("Entering partial_update_profile function for profile_id: {}", profile_id);
    let existing = find_profile(&state.db, profile_id).await?;
    ensure_owner(&existing, &identity)?;
    request.validate()?;

    save_profile(&state.db, existing, identity, request.into()).await
}

// The caller is the owner at this point, so it supplies the username
async fn save_profile(
    db: &DatabaseConnection,
    existing: profile::Model,
    owner: AuthUser,
    changes: ProfileChanges,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let profile_id = existing.id;
    let mut active: profile::ActiveModel = existing.into();
    let updated_fields = changes.apply(&mut active);
    debug!("Updating profile fields: {}", updated_fields.join(", "));

    let updated = active.update(db).await?;
    info!("Profile with ID {} updated successfully", profile_id);
    Ok(Json(ApiResponse::new(
        ProfileResponse::new(updated, owner.into_user().username),
        "Profile updated successfully",
    )))
}

/// Delete a profile
#[utoipa::path(
    delete,
    path = "/api/v1/profiles/{profile_id}",
    tag = "profiles",
    security(("bearer" = [])),
    params(
        ("profile_id" = i32, Path, description = "Profile ID"),
    ),
    responses(
        (status = 204, description = "Profile deleted successfully"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_profile(
    ApiPath(profile_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_profile function for profile_id: {}", profile_id);
    let existing = find_profile(&state.db, profile_id).await?;
    ensure_owner(&existing, &identity)?;

    profile::Entity::delete_by_id(profile_id).exec(&state.db).await?;
    info!("Profile with ID {} deleted successfully", profile_id);
    Ok(StatusCode::NO_CONTENT)
}
