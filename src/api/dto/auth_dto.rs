//! Authentication DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{AccountId, Role};
use crate::service::LoginOutcome;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: u64 = 8;

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login name, matched case-insensitively.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Opaque bearer token.
    pub token: String,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
    /// Account id.
    pub id: AccountId,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub user_email: String,
    /// Role of the account.
    pub user_role: Role,
    /// Team display name; absent for admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let identity = outcome.account.identity();
        Self {
            id: identity.id,
            username: identity.username.clone(),
            user_email: identity.email.clone(),
            user_role: outcome.account.role(),
            team_name: outcome.account.team_name().map(str::to_string),
            token: outcome.token,
            expires_at: outcome.expires_at,
        }
    }
}

/// Response body for `POST /auth/reset-token`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Fresh bearer token.
    pub token: String,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
}

/// Request body for `POST /auth/request-password-reset`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    /// Contact email of the account.
    #[validate(email)]
    pub email: String,
    /// Login name of the account.
    #[validate(length(min = 1))]
    pub username: String,
}

/// Query parameters for `GET /auth/reset-password-precheck`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrecheckParams {
    /// Token from the password link.
    pub token: String,
}

/// Response body for `GET /auth/reset-password-precheck`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrecheckResponse {
    /// `true` if the token is unused and unexpired.
    pub valid: bool,
}

/// Request body for `PUT /auth/reset-password`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Token from the password link.
    #[validate(length(min = 1))]
    pub token: String,
    /// Password to set.
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub new_password: String,
}

/// Request body for `PUT /auth/change-password`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    pub old_password: String,
    /// Password to set.
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub new_password: String,
}

/// Request body for `POST /auth/create-admin`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    /// Login name.
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    /// Contact email.
    #[validate(email)]
    pub email: String,
}

/// Response body for `POST /auth/create-admin` (201 Created).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminResponse {
    /// Id of the new admin.
    pub admin_id: AccountId,
    /// Whether the password setup mail was sent.
    pub setup_mail_sent: bool,
    /// Human-readable outcome.
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountIdentity};

    fn outcome(role: Role) -> LoginOutcome {
        let identity = AccountIdentity {
            id: AccountId::new(),
            username: "arrows".to_string(),
            email: "a@example.com".to_string(),
        };
        LoginOutcome {
            token: "abc".to_string(),
            expires_at: Utc::now(),
            account: Account::from_parts(identity, role, Some("The Arrows".to_string())),
        }
    }

    #[test]
    fn team_login_carries_team_name() {
        let response = LoginResponse::from(outcome(Role::Team));
        let Ok(json) = serde_json::to_value(&response) else {
            panic!("serializable");
        };
        assert_eq!(json["userRole"], "TEAM");
        assert_eq!(json["teamName"], "The Arrows");
        assert_eq!(json["userEmail"], "a@example.com");
    }

    #[test]
    fn admin_login_omits_team_name() {
        let response = LoginResponse::from(outcome(Role::Admin));
        let Ok(json) = serde_json::to_value(&response) else {
            panic!("serializable");
        };
        assert_eq!(json["userRole"], "ADMIN");
        assert!(json.get("teamName").is_none());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let request = ResetPasswordRequest {
            token: "t".to_string(),
            new_password: "short".to_string(),
        };
        assert!(request.validate().is_err());
        let request = ChangePasswordRequest {
            old_password: "whatever".to_string(),
            new_password: "long enough".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
