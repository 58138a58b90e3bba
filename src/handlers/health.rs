use crate::schemas::{AppState, HealthResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{instrument, warn};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, db_status) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            warn!("Database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
        }
    };

    let response = HealthResponse {
        status: if status.is_success() { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status.to_string(),
    };

    (status, Json(response))
}
