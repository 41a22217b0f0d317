//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    database: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, database reachability, version and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, database) = match state.persistence.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "up".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unreachable");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down".to_string())
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            database,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// System routes mounted at the root level (not under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
