//! Player handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use validator::Validate;

use crate::api::dto::CreatePlayerRequest;
use crate::app_state::AppState;
use crate::domain::{Player, Principal};
use crate::error::{ErrorResponse, LeagueError};

/// `POST /player`: Append a player to a team's roster.
///
/// # Errors
///
/// Returns [`LeagueError`] on a blank name, an unknown team or a caller
/// that is neither the team nor an admin.
#[utoipa::path(
    post,
    path = "/api/player",
    tag = "Teams",
    summary = "Add a player",
    request_body = CreatePlayerRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Player added at the end of the roster", body = Player),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not this team", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse),
    )
)]
pub async fn create_player(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreatePlayerRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    req.validate()?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(LeagueError::Validation(
            "player name must not be blank".to_string(),
        ));
    }
    let player = state
        .team_service
        .add_player(&principal, req.team_id, name)
        .await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// Player routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/player", post(create_player))
}
