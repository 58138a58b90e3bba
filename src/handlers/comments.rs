use crate::auth::AuthUser;
use crate::error::{ApiError, FieldErrors, field_messages};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::permissions::ensure_owner;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListQuery};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{Language, comment, phrase, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

/// Request body for creating a comment or replacing all of its fields
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct CommentRequest {
    /// Id of the phrase being commented on
    #[validate(required(message = "This field is required."))]
    pub phrase: Option<i32>,
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
}

/// Request body for a partial comment update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchCommentRequest {
    pub phrase: Option<i32>,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 1000, message = "Ensure this field has no more than 1000 characters.")
    )]
    pub text: Option<String>,
    #[validate(custom(function = "crate::validation::language_choice"))]
    pub text_language: Option<String>,
}

/// Query parameters for listing comments
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CommentQuery {
    #[validate(range(min = 1, max = 10000, message = "Ensure this value is between 1 and 10000."))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 1000, message = "Ensure this value is between 1 and 1000."))]
    pub page_size: Option<u64>,
    /// Only comments on this phrase
    pub phrase: Option<i32>,
}

impl CommentQuery {
    fn pagination(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Comment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    /// Author user id
    pub user: i32,
    /// Author username
    pub username: String,
    /// Phrase the comment belongs to
    pub phrase: i32,
    pub text: String,
    pub text_language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    fn new(model: comment::Model, username: String) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            username,
            phrase: model.phrase_id,
            text: model.text,
            text_language: model.text_language.code(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

struct CommentChanges {
    phrase: Option<i32>,
    text: Option<String>,
    text_language: Option<Language>,
}

impl From<CommentRequest> for CommentChanges {
    fn from(request: CommentRequest) -> Self {
        Self {
            phrase: request.phrase,
            text: request.text,
            text_language: request.text_language.as_deref().and_then(Language::from_code),
        }
    }
}

impl From<PatchCommentRequest> for CommentChanges {
    fn from(request: PatchCommentRequest) -> Self {
        Self {
            phrase: request.phrase,
            text: request.text,
            text_language: request.text_language.as_deref().and_then(Language::from_code),
        }
    }
}

impl CommentChanges {
    fn apply(self, active: &mut comment::ActiveModel) -> Vec<&'static str> {
        let mut updated = Vec::new();
        if let Some(phrase_id) = self.phrase {
            active.phrase_id = Set(phrase_id);
            updated.push("phrase");
        }
        if let Some(text) = self.text {
            active.text = Set(text.trim().to_string());
            updated.push("text");
        }
        if let Some(language) = self.text_language {
            active.text_language = Set(language);
            updated.push("text_language");
        }
        updated
    }
}

/// Runs the field validators and checks that the referenced phrase exists,
/// reporting every failing field at once.
async fn validate_comment(
    db: &DatabaseConnection,
    validation: Result<(), ValidationErrors>,
    phrase_id: Option<i32>,
) -> Result<(), ApiError> {
    let mut fields = match validation {
        Ok(()) => FieldErrors::new(),
        Err(errors) => field_messages(&errors),
    };

    if let Some(phrase_id) = phrase_id {
        let exists = phrase::Entity::find_by_id(phrase_id).count(db).await? > 0;
        if !exists {
            debug!("Comment references missing phrase {}", phrase_id);
            fields
                .entry("phrase".to_string())
                .or_default()
                .push(format!("Invalid pk \"{}\" - object does not exist.", phrase_id));
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

async fn find_comment(db: &DatabaseConnection, comment_id: i32) -> Result<comment::Model, ApiError> {
    match comment::Entity::find_by_id(comment_id).one(db).await? {
        Some(comment) => Ok(comment),
        None => {
            warn!("Comment with ID {} not found", comment_id);
            Err(ApiError::NotFound("Comment"))
        }
    }
}

/// One page of comments with their authors, oldest first.
pub(crate) async fn list_comments(
    db: &DatabaseConnection,
    phrase_id: Option<i32>,
    pagination: &ListQuery,
) -> Result<Vec<CommentResponse>, ApiError> {
    let mut select = comment::Entity::find();
    if let Some(phrase_id) = phrase_id {
        select = select.filter(comment::Column::PhraseId.eq(phrase_id));
    }

    let rows = select
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::Id)
        .offset(pagination.offset())
        .limit(pagination.page_size())
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(comment, author)| {
            let username = author.map(|author| author.username).unwrap_or_default();
            CommentResponse::new(comment, username)
        })
        .collect())
}

/// Comment on a phrase as the caller
#[utoipa::path(
    post,
    path = "/api/v1/comments",
    tag = "comments",
    security(("bearer" = [])),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_comment(
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), ApiError> {
    trace!("Entering create_comment function for user {}", identity.id());
    validate_comment(&state.db, request.validate(), request.phrase).await?;

    let mut new_comment = comment::ActiveModel {
        user_id: Set(identity.id()),
        ..Default::default()
    };
    CommentChanges::from(request).apply(&mut new_comment);

    let comment_model = new_comment.insert(&state.db).await?;
    info!(
        "Comment created successfully with ID: {} on phrase {}",
        comment_model.id, comment_model.phrase_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CommentResponse::new(comment_model, identity.into_user().username),
            "Comment created successfully",
        )),
    ))
}

/// List comments, optionally only those on one phrase
#[utoipa::path(
    get,
    path = "/api/v1/comments",
    tag = "comments",
    security(("bearer" = [])),
    params(CommentQuery),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = ApiResponse<Vec<CommentResponse>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_comments(
    State(state): State<AppState>,
    _identity: AuthUser,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    trace!("Entering get_comments function");
    let comments = list_comments(&state.db, query.phrase, &query.pagination()).await?;

    debug!("Retrieved {} comments", comments.len());
    Ok(Json(ApiResponse::new(comments, "Comments retrieved successfully")))
}

/// Get a specific comment by ID
#[utoipa::path(
    get,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    security(("bearer" = [])),
    params(
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment retrieved successfully", body = ApiResponse<CommentResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_comment(
    ApiPath(comment_id): ApiPath<i32>,
    State(state): State<AppState>,
    _identity: AuthUser,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    trace!("Entering get_comment function for comment_id: {}", comment_id);
    let row = comment::Entity::find_by_id(comment_id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?;

    match row {
        Some((comment_model, author)) => {
            let username = author.map(|author| author.username).unwrap_or_default();
            Ok(Json(ApiResponse::new(
                CommentResponse::new(comment_model, username),
                "Comment retrieved successfully",
            )))
        }
        None => {
            warn!("Comment with ID {} not found", comment_id);
            Err(ApiError::NotFound("Comment"))
        }
    }
}

/// Replace every field of a comment
#[utoipa::path(
    put,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    security(("bearer" = [])),
    params(
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated successfully", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_comment(
    ApiPath(comment_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    trace!("Entering update_comment function for comment_id: {}", comment_id);
    let existing = find_comment(&state.db, comment_id).await?;
    ensure_owner(&existing, &identity)?;
    validate_comment(&state.db, request.validate(), request.phrase).await?;

    save_comment(&state.db, existing, identity, request.into()).await
}

/// Update some fields of a comment
#[utoipa::path(
    patch,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    security(("bearer" = [])),
    params(
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = PatchCommentRequest,
    responses(
        (status = 200, description = "Comment updated successfully", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn partial_update_comment(
    ApiPath(comment_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
    ApiJson(request): ApiJson<PatchCommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    trace!("Entering partial_update_comment function for comment_id: {}", comment_id);
    let existing = find_comment(&state.db, comment_id).await?;
    ensure_owner(&existing, &identity)?;
    validate_comment(&state.db, request.validate(), request.phrase).await?;

    save_comment(&state.db, existing, identity, request.into()).await
}

async fn save_comment(
    db: &DatabaseConnection,
    existing: comment::Model,
    owner: AuthUser,
    changes: CommentChanges,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    let comment_id = existing.id;
    let mut active: comment::ActiveModel = existing.into();
    let updated_fields = changes.apply(&mut active);
    debug!("Updating comment fields: {}", updated_fields.join(", "));

    let updated = active.update(db).await?;
    info!("Comment with ID {} updated successfully", comment_id);
    Ok(Json(ApiResponse::new(
        CommentResponse::new(updated, owner.into_user().username),
        "Comment updated successfully",
    )))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    tag = "comments",
    security(("bearer" = [])),
    params(
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted successfully"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_comment(
    ApiPath(comment_id): ApiPath<i32>,
    State(state): State<AppState>,
    identity: AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_comment function for comment_id: {}", comment_id);
    let existing = find_comment(&state.db, comment_id).await?;
    ensure_owner(&existing, &identity)?;

    comment::Entity::delete_by_id(comment_id).exec(&state.db).await?;
    info!("Comment with ID {} deleted successfully", comment_id);
    Ok(StatusCode::NO_CONTENT)
}
