//! Match handlers: scheduling, score entry, overtime and listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{CreateMatchRequest, OvertimeRequest, PaginationParams, UpdateMatchRequest};
use crate::app_state::AppState;
use crate::domain::{MatchDetail, MatchId, Principal};
use crate::error::{ErrorResponse, LeagueError};
use crate::service::MatchPage;

/// `POST /match`: Schedule a match.
///
/// # Errors
///
/// Returns [`LeagueError`] on a missing field, an unknown team, a captain
/// outside their team, or a caller that plays in neither team.
#[utoipa::path(
    post,
    path = "/api/match",
    tag = "Matches",
    summary = "Create a match",
    description = "Writes the match header and four quarter sheets seeded with the creation line-ups in one transaction. Nothing is stored if any step fails.",
    request_body = CreateMatchRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Match created", body = MatchDetail),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Caller plays in neither team", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse),
    )
)]
pub async fn create_match(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateMatchRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    let new = req.into_new_match(principal.account_id)?;
    let detail = state.match_service.create_match(&principal, new).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /match`: Paginated match list, newest first.
///
/// # Errors
///
/// Returns [`LeagueError::Validation`] for out-of-range paging.
#[utoipa::path(
    get,
    path = "/api/match",
    tag = "Matches",
    summary = "List matches",
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of match headers", body = MatchPage),
        (status = 400, description = "Invalid paging", body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<MatchPage>, LeagueError> {
    let page = state
        .match_service
        .list_matches(params.page, params.limit)
        .await?;
    Ok(Json(page))
}

/// `GET /match/{id}`: Match with quarters and overtime.
///
/// # Errors
///
/// Returns [`LeagueError::NotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/match/{id}",
    tag = "Matches",
    summary = "Get a match",
    params(("id" = uuid::Uuid, Path, description = "Match ID")),
    responses(
        (status = 200, description = "Match detail", body = MatchDetail),
        (status = 404, description = "Match not found", body = ErrorResponse),
    )
)]
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchDetail>, LeagueError> {
    Ok(Json(state.match_service.get_match(id).await?))
}

/// `PUT /match/{id}`: Replace status and all four quarters.
///
/// # Errors
///
/// Returns [`LeagueError`] on an incomplete quarter set, a finished
/// match, an outsider, or a write that misses its row.
#[utoipa::path(
    put,
    path = "/api/match/{id}",
    tag = "Matches",
    summary = "Update a match",
    description = "Updates the header and the four quarter rows in one transaction. Each write must affect exactly one row, otherwise the whole update is rolled back.",
    params(("id" = uuid::Uuid, Path, description = "Match ID")),
    request_body = UpdateMatchRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated match", body = MatchDetail),
        (status = 400, description = "Invalid quarters or status", body = ErrorResponse),
        (status = 403, description = "Caller plays in neither team", body = ErrorResponse),
        (status = 404, description = "Match not found", body = ErrorResponse),
        (status = 409, description = "Match is finished", body = ErrorResponse),
    )
)]
pub async fn update_match(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<MatchId>,
    Json(req): Json<UpdateMatchRequest>,
) -> Result<Json<MatchDetail>, LeagueError> {
    let (status, quarters) = req.into_parts()?;
    let detail = state
        .match_service
        .update_match(&principal, id, status, quarters)
        .await?;
    Ok(Json(detail))
}

/// `PUT /match/{id}/reopen`: Reopen a finished match.
///
/// # Errors
///
/// Returns [`LeagueError`] for a non-admin caller, an unknown match or a
/// match that is not finished.
#[utoipa::path(
    put,
    path = "/api/match/{id}/reopen",
    tag = "Matches",
    summary = "Reopen a match",
    params(("id" = uuid::Uuid, Path, description = "Match ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reopened match", body = MatchDetail),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Match not found", body = ErrorResponse),
        (status = 409, description = "Match is not finished", body = ErrorResponse),
    )
)]
pub async fn reopen_match(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchDetail>, LeagueError> {
    Ok(Json(state.match_service.reopen_match(&principal, id).await?))
}

/// `POST /match/{id}/overtime`: Record the overtime.
///
/// # Errors
///
/// Returns [`LeagueError`] on invalid sheets, a finished match, an
/// existing overtime or an outsider.
#[utoipa::path(
    post,
    path = "/api/match/{id}/overtime",
    tag = "Matches",
    summary = "Create overtime",
    params(("id" = uuid::Uuid, Path, description = "Match ID")),
    request_body = OvertimeRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Match with overtime", body = MatchDetail),
        (status = 400, description = "Invalid sheet", body = ErrorResponse),
        (status = 404, description = "Match not found", body = ErrorResponse),
        (status = 409, description = "Overtime exists or match is finished", body = ErrorResponse),
    )
)]
pub async fn create_overtime(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<MatchId>,
    Json(req): Json<OvertimeRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    let overtime = req.into_overtime()?;
    let detail = state
        .match_service
        .create_overtime(&principal, id, overtime)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `PUT /match/{id}/overtime`: Replace the overtime.
///
/// # Errors
///
/// Returns [`LeagueError`] on invalid sheets, a finished match, a missing
/// overtime or an outsider.
#[utoipa::path(
    put,
    path = "/api/match/{id}/overtime",
    tag = "Matches",
    summary = "Update overtime",
    params(("id" = uuid::Uuid, Path, description = "Match ID")),
    request_body = OvertimeRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Match with overtime", body = MatchDetail),
        (status = 400, description = "Invalid sheet", body = ErrorResponse),
        (status = 404, description = "Match or overtime not found", body = ErrorResponse),
        (status = 409, description = "Match is finished", body = ErrorResponse),
    )
)]
pub async fn update_overtime(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<MatchId>,
    Json(req): Json<OvertimeRequest>,
) -> Result<Json<MatchDetail>, LeagueError> {
    let overtime = req.into_overtime()?;
    let detail = state
        .match_service
        .update_overtime(&principal, id, overtime)
        .await?;
    Ok(Json(detail))
}

/// Match routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/match", post(create_match).get(list_matches))
        .route("/match/{id}", get(get_match).put(update_match))
        .route("/match/{id}/reopen", put(reopen_match))
        .route(
            "/match/{id}/overtime",
            post(create_overtime).put(update_overtime),
        )
}
