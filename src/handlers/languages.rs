use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::schemas::{ApiResponse, ErrorResponse};
use axum::response::Json;
use model::entities::Language;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

/// A supported language
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LanguageResponse {
    /// Language code as stored on phrases and comments
    pub code: String,
    /// English display name
    pub name: String,
}

impl From<Language> for LanguageResponse {
    fn from(language: Language) -> Self {
        Self {
            code: language.code(),
            name: language.name().to_string(),
        }
    }
}

/// List all supported languages
#[utoipa::path(
    get,
    path = "/api/v1/languages",
    tag = "languages",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Languages retrieved successfully", body = ApiResponse<Vec<LanguageResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_languages(_identity: AuthUser) -> Json<ApiResponse<Vec<LanguageResponse>>> {
    let languages: Vec<LanguageResponse> = Language::all().into_iter().map(LanguageResponse::from).collect();
    debug!("Returning {} languages", languages.len());
    Json(ApiResponse::new(languages, "Languages retrieved successfully"))
}

/// Get a language by code
#[utoipa::path(
    get,
    path = "/api/v1/languages/{code}",
    tag = "languages",
    security(("bearer" = [])),
    params(
        ("code" = String, Path, description = "Language code, e.g. `en`"),
    ),
    responses(
        (status = 200, description = "Language retrieved successfully", body = ApiResponse<LanguageResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Language not found", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_language(
    ApiPath(code): ApiPath<String>,
    _identity: AuthUser,
) -> Result<Json<ApiResponse<LanguageResponse>>, ApiError> {
    match Language::from_code(&code) {
        Some(language) => Ok(Json(ApiResponse::new(
            LanguageResponse::from(language),
            "Language retrieved successfully",
        ))),
        None => {
            warn!("Language with code {} not found", code);
            Err(ApiError::NotFound("Language"))
        }
    }
}
