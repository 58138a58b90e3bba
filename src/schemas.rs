use crate::auth::{PasswordHasher, TokenSigner};
use crate::error::FieldErrors;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Password hashing parameters
    pub passwords: PasswordHasher,
    /// Bearer token issuer and verifier
    pub tokens: TokenSigner,
}

/// Pagination parameters shared by the list endpoints
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000, message = "Ensure this value is between 1 and 10000."))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000, message = "Ensure this value is between 1 and 1000."))]
    pub page_size: Option<u64>,
}

impl ListQuery {
    pub const DEFAULT_PAGE_SIZE: u64 = 100;

    /// Zero based page index as expected by the SeaORM paginator.
    pub fn page_index(&self) -> u64 {
        self.page.unwrap_or(1).saturating_sub(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE)
    }

    /// Number of rows to skip before the requested page.
    pub fn offset(&self) -> u64 {
        self.page_index() * self.page_size()
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation messages, present only for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::obtain_token,
        crate::handlers::users::create_user,
        crate::handlers::users::get_login_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::partial_update_user,
        crate::handlers::users::delete_user,
        crate::handlers::profiles::create_profile,
        crate::handlers::profiles::get_profiles,
        crate::handlers::profiles::get_profile,
        crate::handlers::profiles::update_profile,
        crate::handlers::profiles::partial_update_profile,
        crate::handlers::profiles::delete_profile,
        crate::handlers::languages::get_languages,
        crate::handlers::languages::get_language,
        crate::handlers::phrases::create_phrase,
        crate::handlers::phrases::get_phrases,
        crate::handlers::phrases::get_phrase,
        crate::handlers::phrases::get_phrase_comments,
        crate::handlers::phrases::update_phrase,
        crate::handlers::phrases::partial_update_phrase,
        crate::handlers::phrases::delete_phrase,
        crate::handlers::comments::create_comment,
        crate::handlers::comments::get_comments,
        crate::handlers::comments::get_comment,
        crate::handlers::comments::update_comment,
        crate::handlers::comments::partial_update_comment,
        crate::handlers::comments::delete_comment,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            ListQuery,
            crate::handlers::auth::TokenRequest,
            crate::handlers::auth::TokenResponse,
            crate::handlers::users::UserRequest,
            crate::handlers::users::PatchUserRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::profiles::ProfileRequest,
            crate::handlers::profiles::PatchProfileRequest,
            crate::handlers::profiles::ProfileResponse,
            crate::handlers::languages::LanguageResponse,
            crate::handlers::phrases::PhraseRequest,
            crate::handlers::phrases::PatchPhraseRequest,
            crate::handlers::phrases::PhraseResponse,
            crate::handlers::comments::CommentRequest,
            crate::handlers::comments::PatchCommentRequest,
            crate::handlers::comments::CommentResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Bearer token issuance"),
        (name = "users", description = "Account management"),
        (name = "profiles", description = "One profile per user"),
        (name = "languages", description = "Supported language codes"),
        (name = "phrases", description = "Phrases and their translations"),
        (name = "comments", description = "Comments left on phrases"),
    ),
    info(
        title = "Friends Phrase API",
        description = "Language-learning social backend: share phrases with their translations and comment on them",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by the protected paths.
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("HMAC")
                        .build(),
                ),
            );
        }
    }
}
