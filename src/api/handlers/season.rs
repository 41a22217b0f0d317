//! Season handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use validator::Validate;

use crate::api::dto::{CreateSeasonRequest, MessageResponse};
use crate::app_state::AppState;
use crate::domain::{Principal, Season, SeasonId};
use crate::error::{ErrorResponse, LeagueError};

/// `GET /seasons`: All seasons, newest first.
///
/// # Errors
///
/// Returns [`LeagueError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/seasons",
    tag = "Seasons",
    summary = "List seasons",
    responses(
        (status = 200, description = "Seasons", body = Vec<Season>),
    )
)]
pub async fn list_seasons(
    State(state): State<AppState>,
) -> Result<Json<Vec<Season>>, LeagueError> {
    Ok(Json(state.season_service.list_seasons().await?))
}

/// `POST /seasons`: Create an inactive season.
///
/// # Errors
///
/// Returns [`LeagueError`] on a blank name or a non-admin caller.
#[utoipa::path(
    post,
    path = "/api/seasons",
    tag = "Seasons",
    summary = "Create a season",
    request_body = CreateSeasonRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Season created", body = Season),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn create_season(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateSeasonRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    req.validate()?;
    if req.name.trim().is_empty() {
        return Err(LeagueError::Validation("name must not be blank".to_string()));
    }
    let season = state
        .season_service
        .create_season(&principal, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(season)))
}

/// `PUT /seasons/{id}`: Make a season the only active one.
///
/// # Errors
///
/// Returns [`LeagueError`] for an unknown season or a non-admin caller.
#[utoipa::path(
    put,
    path = "/api/seasons/{id}",
    tag = "Seasons",
    summary = "Activate a season",
    description = "Clears the active flag of every season and sets it on this one, in one transaction.",
    params(("id" = uuid::Uuid, Path, description = "Season ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Season activated", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Season not found", body = ErrorResponse),
    )
)]
pub async fn activate_season(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<SeasonId>,
) -> Result<Json<MessageResponse>, LeagueError> {
    state
        .season_service
        .activate_season(&principal, id)
        .await?;
    Ok(Json(MessageResponse::new(format!("season {id} is now active"))))
}

/// Season routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/seasons", get(list_seasons).post(create_season))
        .route("/seasons/{id}", put(activate_season))
}
