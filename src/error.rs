use crate::auth::CredentialError;
use crate::schemas::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::{DbErr, SqlErr};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};
use validator::ValidationErrors;

/// Validation messages keyed by request field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Every way a request can fail.
///
/// Each variant maps to one HTTP status and one stable `code` string; the
/// rendered body is always an [`ErrorResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more request fields are missing, blank or invalid
    #[error("Invalid input.")]
    Validation(FieldErrors),

    /// The body is not parseable JSON
    #[error("{0}")]
    MalformedBody(String),

    #[error("Unsupported media type \"{0}\" in request.")]
    UnsupportedMediaType(String),

    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    #[error("Given token not valid for any token type")]
    InvalidToken,

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    /// The caller does not own the resource it tries to modify
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("{0} not found.")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl ApiError {
    /// Turns a unique constraint violation into a conflict, anything else
    /// stays a database error.
    pub fn conflict_or_db(err: DbErr, code: &'static str, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                debug!("Unique constraint violated: {}", detail);
                ApiError::Conflict {
                    code,
                    message: message.into(),
                }
            }
            _ => ApiError::Database(err),
        }
    }

    /// A validation failure on a single field.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::from([(name.into(), vec![message.into()])]))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotAuthenticated | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MalformedBody(_) => "PARSE_ERROR",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::NotAuthenticated => "NOT_AUTHENTICATED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::PermissionDenied => "PERMISSION_DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict { code, .. } => *code,
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Credential(_) => "INTERNAL_ERROR",
        }
    }
}

/// Flattens validator output into messages keyed by field name.
pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(field_messages(&errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details are logged, never returned
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            debug!("Request rejected with {}: {}", status, self);
            self.to_string()
        };

        let code = self.code().to_string();
        let fields = match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorResponse {
            error: message,
            code,
            success: false,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
