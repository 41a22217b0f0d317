//! League error types with HTTP status code mapping.
//!
//! [`LeagueError`] is the central error type of the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::StandingsError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: homeCaptain is required"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1099 | Validation      | 400 Bad Request              |
/// | 1100–1199 | Authentication  | 401 Unauthorized             |
/// | 1200–1299 | Authorization   | 403 Forbidden                |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Username/password pair did not match an active account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password setup/reset token is unknown, expired or already used.
    #[error("invalid or expired password token")]
    InvalidPasswordToken,

    /// No bearer token on a protected route.
    #[error("access denied, login required")]
    MissingToken,

    /// Bearer token is unknown or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Caller lacks the role for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Entity with the given id was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"match"`.
        entity: &'static str,
        /// Requested id.
        id: String,
    },

    /// Operation conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure, including writes that affected an
    /// unexpected number of rows.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Standings input rows were structurally incomplete.
    #[error("standings error: {0}")]
    Standings(#[from] StandingsError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeagueError {
    /// Shorthand for [`LeagueError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidCredentials => 1002,
            Self::InvalidPasswordToken => 1003,
            Self::MissingToken => 1101,
            Self::InvalidToken => 1102,
            Self::Forbidden(_) => 1201,
            Self::NotFound { .. } => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Standings(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials | Self::InvalidPasswordToken => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Standings(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for LeagueError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Maps a database failure into [`LeagueError::Persistence`].
pub(crate) fn persistence(err: sqlx::Error) -> LeagueError {
    LeagueError::Persistence(err.to_string())
}

impl IntoResponse for LeagueError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
            "some error has occurred".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message,
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{MatchId, TeamId};

    async fn body_json(err: LeagueError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice(&bytes) else {
            panic!("body is not json");
        };
        (status, json)
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            LeagueError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LeagueError::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LeagueError::Forbidden("admins only".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LeagueError::not_found("team", TeamId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LeagueError::Persistence("0 rows".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let (status, json) = body_json(LeagueError::Validation("homeCaptain is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], 1001);
        assert_eq!(
            json["error"]["message"],
            "invalid request: homeCaptain is required"
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let err = LeagueError::Standings(StandingsError::UnexpectedQuarter {
            match_id: MatchId::new(),
            quarter: 9,
        });
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], 3002);
        assert_eq!(json["error"]["message"], "some error has occurred");
    }
}
