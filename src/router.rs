use crate::handlers::{
    auth::obtain_token,
    comments::{
        create_comment, delete_comment, get_comment, get_comments, partial_update_comment,
        update_comment,
    },
    health::health_check,
    languages::{get_language, get_languages},
    phrases::{
        create_phrase, delete_phrase, get_phrase, get_phrase_comments, get_phrases,
        partial_update_phrase, update_phrase,
    },
    profiles::{
        create_profile, delete_profile, get_profile, get_profiles, partial_update_profile,
        update_profile,
    },
    users::{create_user, delete_user, get_login_user, get_user, partial_update_user, update_user},
};
use crate::error::ApiError;
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/token", post(obtain_token))
        // Users
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/login_user", get(get_login_user))
        .route(
            "/api/v1/users/:user_id",
            get(get_user)
                .put(update_user)
                .patch(partial_update_user)
                .delete(delete_user),
        )
        // Profiles
        .route("/api/v1/profiles", get(get_profiles).post(create_profile))
        .route(
            "/api/v1/profiles/:profile_id",
            get(get_profile)
                .put(update_profile)
                .patch(partial_update_profile)
                .delete(delete_profile),
        )
        // Languages
        .route("/api/v1/languages", get(get_languages))
        .route("/api/v1/languages/:code", get(get_language))
        // Phrases
        .route("/api/v1/phrases", get(get_phrases).post(create_phrase))
        .route(
            "/api/v1/phrases/:phrase_id",
            get(get_phrase)
                .put(update_phrase)
                .patch(partial_update_phrase)
                .delete(delete_phrase),
        )
        .route("/api/v1/phrases/:phrase_id/comments", get(get_phrase_comments))
        // Comments
        .route("/api/v1/comments", get(get_comments).post(create_comment))
        .route(
            "/api/v1/comments/:comment_id",
            get(get_comment)
                .put(update_comment)
                .patch(partial_update_comment)
                .delete(delete_comment),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(unknown_route)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn unknown_route() -> ApiError {
    ApiError::NotFound("Resource")
}
