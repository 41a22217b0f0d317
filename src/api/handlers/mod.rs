//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod matches;
pub mod player;
pub mod season;
pub mod system;
pub mod team;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(team::routes())
        .merge(player::routes())
        .merge(matches::routes())
        .merge(season::routes())
        .merge(auth::routes())
}
