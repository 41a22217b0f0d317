//! Authentication handlers: sessions and password management.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use validator::Validate;

use crate::api::dto::{
    ChangePasswordRequest, CreateAdminRequest, CreateAdminResponse, LoginRequest, LoginResponse,
    MessageResponse, PasswordResetRequest, PrecheckParams, PrecheckResponse, ResetPasswordRequest,
    TokenResponse,
};
use crate::api::extract::Session;
use crate::app_state::AppState;
use crate::domain::Principal;
use crate::error::{ErrorResponse, LeagueError};
use crate::service::authorize_admin;

/// `POST /auth/login`: Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns [`LeagueError::InvalidCredentials`] on a bad username/password
/// pair.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, LeagueError> {
    let outcome = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(LoginResponse::from(outcome)))
}

/// `POST /auth/logout`: Revoke the presented session.
///
/// # Errors
///
/// Returns [`LeagueError`] if the token is missing or already revoked.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<MessageResponse>, LeagueError> {
    state.auth_service.logout(&session.token).await?;
    Ok(Json(MessageResponse::new("logged out")))
}

/// `POST /auth/reset-token`: Swap the presented session for a fresh one.
///
/// # Errors
///
/// Returns [`LeagueError`] if the token is missing or invalid.
#[utoipa::path(
    post,
    path = "/api/auth/reset-token",
    tag = "Auth",
    summary = "Refresh session",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New token; the old one is revoked", body = TokenResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<TokenResponse>, LeagueError> {
    let (token, expires_at) = state
        .auth_service
        .refresh_session(&session.principal, &session.token)
        .await?;
    Ok(Json(TokenResponse { token, expires_at }))
}

/// `POST /auth/request-password-reset`: Mail a reset link.
///
/// # Errors
///
/// Returns [`LeagueError::NotFound`] if no account matches both the
/// email and username.
#[utoipa::path(
    post,
    path = "/api/auth/request-password-reset",
    tag = "Auth",
    summary = "Request a password reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset mail sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "No matching account", body = ErrorResponse),
    )
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, LeagueError> {
    req.validate()?;
    state
        .auth_service
        .request_password_reset(&req.email, &req.username)
        .await?;
    Ok(Json(MessageResponse::new("password reset mail sent")))
}

/// `GET /auth/reset-password-precheck`: Check a password link token.
///
/// # Errors
///
/// Returns [`LeagueError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/auth/reset-password-precheck",
    tag = "Auth",
    summary = "Check a password token",
    params(PrecheckParams),
    responses(
        (status = 200, description = "Token validity", body = PrecheckResponse),
    )
)]
pub async fn reset_password_precheck(
    State(state): State<AppState>,
    Query(params): Query<PrecheckParams>,
) -> Result<Json<PrecheckResponse>, LeagueError> {
    let valid = state
        .auth_service
        .password_token_is_valid(&params.token)
        .await?;
    Ok(Json(PrecheckResponse { valid }))
}

/// `PUT /auth/reset-password`: Set a password with a link token.
///
/// # Errors
///
/// Returns [`LeagueError::InvalidPasswordToken`] for an unknown, expired
/// or used token.
#[utoipa::path(
    put,
    path = "/api/auth/reset-password",
    tag = "Auth",
    summary = "Reset password",
    description = "Consumes the token, sets the password and revokes every session of the account.",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password set", body = MessageResponse),
        (status = 400, description = "Invalid token or password", body = ErrorResponse),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, LeagueError> {
    req.validate()?;
    state
        .auth_service
        .reset_password(&req.token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("password updated")))
}

/// `PUT /auth/change-password`: Change the caller's password.
///
/// # Errors
///
/// Returns [`LeagueError::InvalidCredentials`] if the old password does
/// not match.
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "Auth",
    summary = "Change password",
    request_body = ChangePasswordRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong old password", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, LeagueError> {
    req.validate()?;
    state
        .auth_service
        .change_password(&principal, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("password changed")))
}

/// `POST /auth/create-admin`: Create another administrator.
///
/// # Errors
///
/// Returns [`LeagueError`] on invalid input, a taken username or a
/// non-admin caller.
#[utoipa::path(
    post,
    path = "/api/auth/create-admin",
    tag = "Auth",
    summary = "Create an admin",
    request_body = CreateAdminRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Admin created", body = CreateAdminResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse, LeagueError> {
    authorize_admin(&principal)?;
    req.validate()?;
    let (admin_id, setup_mail_sent) = state
        .auth_service
        .create_admin(&req.username, &req.email)
        .await?;
    let message = if setup_mail_sent {
        "admin created, setup mail sent"
    } else {
        "admin created, setup mail could not be sent"
    };
    Ok((
        StatusCode::CREATED,
        Json(CreateAdminResponse {
            admin_id,
            setup_mail_sent,
            message: message.to_string(),
        }),
    ))
}

/// Auth routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/reset-token", post(refresh_token))
        .route("/auth/request-password-reset", post(request_password_reset))
        .route("/auth/reset-password-precheck", get(reset_password_precheck))
        .route("/auth/reset-password", put(reset_password))
        .route("/auth/change-password", put(change_password))
        .route("/auth/create-admin", post(create_admin))
}
