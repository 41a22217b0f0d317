//! Team handlers: registration, roster maintenance and standings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    CreateTeamRequest, CreateTeamResponse, ListTeamsParams, MessageResponse, PlayerOrderRequest,
    UniqueUsernameResponse, UpdateTeamRequest, normalize_login,
};
use crate::app_state::AppState;
use crate::domain::{Principal, Team, TeamId, TeamStanding};
use crate::error::{ErrorResponse, LeagueError};

/// `POST /team`: Register a team with its initial players.
///
/// # Errors
///
/// Returns [`LeagueError`] on invalid input, a taken username or a
/// non-admin caller.
#[utoipa::path(
    post,
    path = "/api/team",
    tag = "Teams",
    summary = "Create a team",
    description = "Creates the team account, its initial players and a password setup token in one transaction, then mails the setup link to the team email.",
    request_body = CreateTeamRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Team created", body = CreateTeamResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
    )
)]
pub async fn create_team(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    let new = req.into_new_team()?;
    let created = state.team_service.create_team(&principal, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team: created.team,
            setup_mail_sent: created.setup_mail_sent,
        }),
    ))
}

/// `GET /team`: List teams with their active players.
///
/// # Errors
///
/// Returns [`LeagueError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Teams",
    summary = "List teams",
    params(ListTeamsParams),
    responses(
        (status = 200, description = "Teams ordered by name", body = Vec<Team>),
    )
)]
pub async fn list_teams(
    State(state): State<AppState>,
    Query(params): Query<ListTeamsParams>,
) -> Result<Json<Vec<Team>>, LeagueError> {
    let teams = state
        .team_service
        .list_teams(params.include_archived)
        .await?;
    Ok(Json(teams))
}

/// `GET /team/is-unique/{username}`: Check username availability.
///
/// # Errors
///
/// Returns [`LeagueError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/team/is-unique/{username}",
    tag = "Teams",
    summary = "Check username availability",
    params(("username" = String, Path, description = "Candidate login name")),
    responses(
        (status = 200, description = "Availability", body = UniqueUsernameResponse),
    )
)]
pub async fn username_is_unique(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UniqueUsernameResponse>, LeagueError> {
    let is_unique = state.team_service.username_is_unique(&username).await?;
    Ok(Json(UniqueUsernameResponse {
        username: normalize_login(&username),
        is_unique,
    }))
}

/// `GET /team/standings`: Ranked standings table.
///
/// # Errors
///
/// Returns [`LeagueError`] on database failure or malformed score data.
#[utoipa::path(
    get,
    path = "/api/team/standings",
    tag = "Teams",
    summary = "Standings",
    description = "Folds the finished matches of the active season (or of all seasons when none is active) into one row per active team, ranked by points, wins, legs won and name.",
    responses(
        (status = 200, description = "Ranked table", body = Vec<TeamStanding>),
        (status = 500, description = "Incomplete score data", body = ErrorResponse),
    )
)]
pub async fn standings(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamStanding>>, LeagueError> {
    Ok(Json(state.team_service.standings().await?))
}

/// `GET /team/{id}`: Team detail.
///
/// # Errors
///
/// Returns [`LeagueError::NotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/team/{id}",
    tag = "Teams",
    summary = "Get a team",
    params(("id" = uuid::Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team with players", body = Team),
        (status = 404, description = "Team not found", body = ErrorResponse),
    )
)]
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
) -> Result<Json<Team>, LeagueError> {
    Ok(Json(state.team_service.get_team(id).await?))
}

/// `PUT /team/{id}`: Replace name, email and roster.
///
/// # Errors
///
/// Returns [`LeagueError`] on invalid input, an unknown team or player,
/// or a non-admin caller.
#[utoipa::path(
    put,
    path = "/api/team/{id}",
    tag = "Teams",
    summary = "Update a team",
    description = "Players listed with an id are renamed and reordered, players without one are added, active players left out are archived.",
    params(("id" = uuid::Uuid, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated team", body = Team),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Team or player not found", body = ErrorResponse),
    )
)]
pub async fn update_team(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<Team>, LeagueError> {
    let update = req.into_update()?;
    let team = state
        .team_service
        .update_team(&principal, id, update)
        .await?;
    Ok(Json(team))
}

/// `DELETE /team/{id}`: Archive a team.
///
/// # Errors
///
/// Returns [`LeagueError`] for an unknown team or a non-admin caller.
#[utoipa::path(
    delete,
    path = "/api/team/{id}",
    tag = "Teams",
    summary = "Archive a team",
    params(("id" = uuid::Uuid, Path, description = "Team ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Team archived", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse),
    )
)]
pub async fn archive_team(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
) -> Result<Json<MessageResponse>, LeagueError> {
    state.team_service.archive_team(&principal, id).await?;
    Ok(Json(MessageResponse::new(format!("team {id} archived"))))
}

/// `PUT /team/{id}/player-order`: Reorder the roster.
///
/// # Errors
///
/// Returns [`LeagueError`] for an empty or duplicated list, a player not
/// on the team, or a caller that is neither the team nor an admin.
#[utoipa::path(
    put,
    path = "/api/team/{id}/player-order",
    tag = "Teams",
    summary = "Reorder players",
    params(("id" = uuid::Uuid, Path, description = "Team ID")),
    request_body = PlayerOrderRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Team with the new order", body = Team),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not this team", body = ErrorResponse),
        (status = 404, description = "Team or player not found", body = ErrorResponse),
    )
)]
pub async fn set_player_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
    Json(req): Json<PlayerOrderRequest>,
) -> Result<Json<Team>, LeagueError> {
    let order = req.into_order()?;
    let team = state
        .team_service
        .set_player_order(&principal, id, &order)
        .await?;
    Ok(Json(team))
}

/// Team routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/team", post(create_team).get(list_teams))
        .route("/team/is-unique/{username}", get(username_is_unique))
        .route("/team/standings", get(standings))
        .route(
            "/team/{id}",
            get(get_team).put(update_team).delete(archive_team),
        )
        .route("/team/{id}/player-order", put(set_player_order))
}
