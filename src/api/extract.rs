//! Bearer-token extractors.
//!
//! A handler that takes a [`Principal`] only runs for an authenticated
//! caller. [`Session`] additionally exposes the raw token, for logout and
//! session refresh.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::Principal;
use crate::error::LeagueError;

/// The authenticated caller together with the token it presented.
#[derive(Debug, Clone)]
pub struct Session {
    /// Resolved caller.
    pub principal: Principal,
    /// Raw bearer token.
    pub token: String,
}

/// Reads the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns [`LeagueError::MissingToken`] if the header is absent or does
/// not carry a bearer token.
pub fn bearer_token(parts: &Parts) -> Result<String, LeagueError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(LeagueError::MissingToken)?;
    let (scheme, token) = value.split_once(' ').ok_or(LeagueError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(LeagueError::MissingToken);
    }
    Ok(token.to_string())
}

impl FromRequestParts<AppState> for Session {
    type Rejection = LeagueError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let principal = state.auth_service.authenticate(&token).await?;
        Ok(Self { principal, token })
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = LeagueError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(session.principal)
    }
}
