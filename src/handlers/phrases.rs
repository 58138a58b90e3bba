use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::comments::{CommentResponse, list_comments};
use crate::permissions::ensure_owner;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListQuery};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::{
    cascade,
    entities::{Language, phrase, user},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating a phrase or replacing all of its fields
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PhraseRequest {
    /// Source text
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::not_blank"),
        length(max = 1000, message = "Ensure this field has no more than 1000 characters.")
    )]
    pub text: Option<String>,
    /// Language code of `text`
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::language_choice")
    )]
    pub text_language: Option<String>,
    /// Translation of `text`
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::not_blank"),
        length(max = 1000, message = "Ensure this field has no more than 1000 characters.")
    )]
    pub translated_word: Option<String>,
    /// Language code of `translated_word`
    #[validate(
        required(message = "This field is required."),
        custom(function = "crate::validation::language_choice")
    )]
    pub translated_word_language: Option<String>,
}

/// Request body for a partial phrase update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchPhraseRequest {
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 1000, message = "Ensure this field has no more than 1000 characters.")
    )]
    pub text: Option<String>,
    #[validate(custom(function = "crate::validation::language_choice"))]
    pub text_language: Option<String>,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 1000, message = "Ensure this field has no more than 1000 characters.")
    )]
    pub translated_word: Option<String>,
    #[validate(custom(function = "crate::validation::language_choice"))]
    pub translated_word_language: Option<String>,
}

/// Query parameters for listing phrases
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PhraseQuery {
    #[validate(range(min = 1, max = 10000, message = "Ensure this value is between 1 and 10000."))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 1000, message = "Ensure this value is between 1 and 1000."))]
    pub page_size: Option<u64>,
    /// Only phrases created by this user
    pub user: Option<i32>,
}

impl PhraseQuery {
    fn pagination(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Phrase response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhraseResponse {
    pub id: i32,
    /// Owning user id
    pub user: i32,
    /// Owning user's username
    pub username: String,
    pub text: String,
    pub text_language: String,
    pub translated_word: String,
    pub translated_word_language: String,
    /// Number of comments on this phrase
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhraseResponse {
    fn new(model: phrase::Model, username: String, comments_count: u64) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            username,
            text: model.text,
            text_language: model.text_language.code(),
            translated_word: model.translated_word,
            translated_word_language: model.translated_word_language.code(),
            comments_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

struct PhraseChanges {
    text: Option<String>,
    text_language: Option<Language>,
    translated_word: Option<String>,
    translated_word_language: Option<Language>,
}

impl From<PhraseRequest> for PhraseChanges {
    fn from(request: PhraseRequest) -> Self {
        Self {
            text: request.text,
            text_language: request.text_language.as_deref().and_then(Language::from_code),
            translated_word: request.translated_word,
            translated_word_language: request
                .translated_word_language
                .as_deref()
                .and_then(Language::from_code),
        }
    }
}

impl From<PatchPhraseRequest> for PhraseChanges {
    fn from(request: PatchPhraseRequest) -> Self {
        Self {
            text: request.text,
            text_language: request.text_language.as_deref().and_then(Language::from_code),
            translated_word: request.translated_word,
            translated_word_language: request
                .translated_word_language
                .as_deref()
                .and_then(Language::from_code),
        }
    }
}

impl PhraseChanges {
    fn apply(self, active: &mut phrase::ActiveModel) -> Vec<&'static str> {
        let mut updated = Vec::new();
        if let Some(text) = self.text {
            active.text = Set(text.trim().to_string());
            updated.push("text");
        }
        if let Some(language) = self.text_language {
            active.text_language = Set(language);
            updated.push("text_language");
        }
        if let Some(translated_word) = self.translated_word {
            active.translated_word = Set(translated_word.trim().to_string());
            updated.push("translated_word");
        }
        if let Some(language) = self.translated_word_language {
            active.translated_word_language = Set(language);
            updated.push("translated_word_language");
        }
        updated
    }
}

async fn find_phrase(db: &DatabaseConnection, phrase_id: i32) -> Result<phrase::Model, ApiError> {
    match phrase::Entity::find_by_id(phrase_id).one(db).await? {
        Some(phrase) => Ok(phrase),
        None => {
            warn!("Phrase with ID {} not found", phrase_id);
            Err(ApiError::NotFound("Phrase"))
        }
    }
}

/// Create a phrase owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/phrases",
    tag = "phrases",
    security(("bearer" = [])),
    request_body = PhraseRequest,
    responses(
        (status = 201, description = "Phrase created successfully", body = ApiResponse<PhraseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_phrase(
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PhraseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PhraseResponse>>), ApiError> {
    trace!("Entering create_phrase function for user {}", identity.id());
    request.validate()?;

    let mut new_phrase = phrase::ActiveModel {
        user_id: Set(identity.id()),
        ..Default::default()
    };
    PhraseChanges::from(request).apply(&mut new_phrase);

    let phrase_model = new_phrase.insert(&state.db).await?;
    info!("Phrase created successfully with ID: {} for user {}", phrase_model.id, identity.id());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            PhraseResponse::new(phrase_model, identity.into_user().username, 0),
            "Phrase created successfully",
        )),
    ))
}

/// List phrases, optionally only those of one user
#[utoipa::path(
    get,
    path = "/api/v1/phrases",
    tag = "phrases",
    security(("bearer" = [])),
    params(PhraseQuery),
    responses(
        (status = 200, description = "Phrases retrieved successfully", body = ApiResponse<Vec<PhraseResponse>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_phrases(
    State(state): State<AppState>,
    _identity: AuthUser,
    ApiQuery(query): ApiQuery<PhraseQuery>,
) -> Result<Json<ApiResponse<Vec<PhraseResponse>>>, ApiError> {
    trace!("Entering get_phrases function");
    let pagination = query.pagination();

    let mut select = phrase::Entity::find();
    if let Some(user_id) = query.user {
        debug!("Filtering phrases by user {}", user_id);
        select = select.filter(phrase::Column::UserId.eq(user_id));
    }

    let rows = select
        .find_also_related(user::Entity)
        .order_by_asc(phrase::Column::Id)
        .offset(pagination.offset())
        .limit(pagination.page_size())
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|(phrase, _)| phrase.id).collect();
    let counts = phrase::Model::comments_counts(&state.db, &ids).await?;

    let phrases: Vec<PhraseResponse> = rows
        .into_iter()
        .map(|(phrase, owner)| {
            let count = counts.get(&phrase.id).copied().unwrap_or(0);
            let username = owner.map(|owner| owner.username).unwrap_or_default();
            PhraseResponse::new(phrase, username, count)
        })
        .collect();

    debug!("Retrieved {} phrases", phrases.len());
    Ok(Json(ApiResponse::new(phrases, "Phrases retrieved successfully")))
}

/// Get a specific phrase by ID
#[utoipa::path(
    get,
    path = "/api/v1/phrases/{phrase_id}",
    tag = "phrases",
    security(("bearer" = [])),
    params(
        ("phrase_id" = i32, Path, description = "Phrase ID"),
    ),
    responses(
        (status = 200, description = "Phrase retrieved successfully", body = ApiResponse<PhraseResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Phrase not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_phrase(
    ApiPath(phrase_id): ApiPath<i32>,
    State(state): State<AppState>,
    _identity: AuthUser,
) -> Result<Json<ApiResponse<PhraseResponse>>, ApiError> {
    trace!("Entering get_phrase function for phrase_id: {}", phrase_id);
    let row = phrase::Entity::find_by_id(phrase_id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?;

    let Some((phrase_model, owner)) = row else {
        warn!("Phrase with ID {} not found", phrase_id);
        return Err(ApiError::NotFound("Phrase"));
    };

    let count = phrase_model.comments_count(&state.db).await?;
    let username = owner.map(|owner| owner.username).unwrap_or_default();
    Ok(Json(ApiResponse::new(
        PhraseResponse::new(phrase_model, username, count),
        "Phrase retrieved successfully",
    )))
}

/// List the comments left on a phrase
#[utoipa::path(
    get,
    path = "/api/v1/phrases/{phrase_id}/comments",
    tag = "phrases",
    security(("bearer" = [])),
    params(
        ("phrase_id" = i32, Path, description = "Phrase ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = ApiResponse<Vec<CommentResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Phrase not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_phrase_comments(
    ApiPath(phrase_id): ApiPath<i32>,
    State(state): State<AppState>,
    _identity: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    trace!("Entering get_phrase_comments function for phrase_id: {}", phrase_id);
    find_phrase(&state.db, phrase_id).await?;

    let comments = list_comments(&state.db, Some(phrase_id), &query).await?;
    debug!("Phrase {} has {} comments on this page", phrase_id, comments.len());
    Ok(Json(ApiResponse::new(comments, "Comments retrieved successfully")))
}

/// Replace every field of a phrase
#[utoipa::path(
    put,
    path = "/api/v1/phrases/{phrase_id}",
    tag = "phrases",
    security(("bearer" = [])),
    params(
        ("phrase_id" = i32, Path, description = "Phrase ID"),
    ),
    request_body = PhraseRequest,
    responses(
        (status = 200, description = "Phrase updated successfully", body = ApiResponse<PhraseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Phrase not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_phrase(
    ApiPath(phrase_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PhraseRequest>,
) -> Result<Json<ApiResponse<PhraseResponse>>, ApiError> {
    trace!("Entering update_phrase function for phrase_id: {}", phrase_id);
    let existing = find_phrase(&state.db, phrase_id).await?;
    ensure_owner(&existing, &identity)?;
    request.validate()?;

    save_phrase(&state.db, existing, identity, request.into()).await
}

/// Update some fields of a phrase
#[utoipa::path(
    patch,
    path = "/api/v1/phrases/{phrase_id}",
    tag = "phrases",
    security(("bearer" = [])),
    params(
        ("phrase_id" = i32, Path, description = "Phrase ID"),
    ),
    request_body = PatchPhraseRequest,
    responses(
        (status = 200, description = "Phrase updated successfully", body = ApiResponse<PhraseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Phrase not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn partial_update_phrase(
    ApiPath(phrase_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PatchPhraseRequest>,
) -> Result<Json<ApiResponse<PhraseResponse>>, ApiError> {
    trace!("Entering partial_update_phrase function for phrase_id: {}", phrase_id);
    let existing = find_phrase(&state.db, phrase_id).await?;
    ensure_owner(&existing, &identity)?;
    request.validate()?;

    save_phrase(&state.db, existing, identity, request.into()).await
}

async fn save_phrase(
    db: &DatabaseConnection,
    existing: phrase::Model,
    owner: AuthUser,
    changes: PhraseChanges,
) -> Result<Json<ApiResponse<PhraseResponse>>, ApiError> {
    let phrase_id = existing.id;
    let mut active: phrase::ActiveModel = existing.into();
    let updated_fields = changes.apply(&mut active);
    debug!("Updating phrase fields: {}", updated_fields.join(", "));

    let updated = active.update(db).await?;
    let count = updated.comments_count(db).await?;

    info!("Phrase with ID {} updated successfully", phrase_id);
    Ok(Json(ApiResponse::new(
        PhraseResponse::new(updated, owner.into_user().username, count),
        "Phrase updated successfully",
    )))
}

/// Delete a phrase and its comments
#[utoipa::path(
    delete,
    path = "/api/v1/phrases/{phrase_id}",
    tag = "phrases",
    security(("bearer" = [])),
    params(
        ("phrase_id" = i32, Path, description = "Phrase ID"),
    ),
    responses(
        (status = 204, description = "Phrase deleted successfully"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Phrase not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_phrase(
    ApiPath(phrase_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_phrase function for phrase_id: {}", phrase_id);
    let existing = find_phrase(&state.db, phrase_id).await?;
    ensure_owner(&existing, &identity)?;

    let summary = cascade::delete_phrase(&state.db, phrase_id).await?;
    info!(
        "Phrase with ID {} deleted together with {} comment(s)",
        phrase_id, summary.comments
    );
    Ok(StatusCode::NO_CONTENT)
}
