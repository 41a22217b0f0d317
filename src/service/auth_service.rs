//! Authentication: login sessions and password setup/reset.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::credentials::{generate_token, hash_password, hash_token, verify_password};
use super::mailer::{MailMessage, Mailer};
use crate::config::LeagueConfig;
use crate::domain::{Account, AccountId, Principal};
use crate::error::LeagueError;
use crate::persistence::{PasswordTokenRecord, PostgresPersistence, TokenPurpose};

/// A freshly opened session.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Bearer token; only its digest is stored.
    pub token: String,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
    /// The logged-in account.
    pub account: Account,
}

/// A password token ready to be stored and mailed.
#[derive(Debug, Clone)]
pub struct IssuedPasswordToken {
    /// Raw token for the link.
    pub token: String,
    /// Stored form.
    pub record: PasswordTokenRecord,
}

/// Owns sessions, password tokens and the password link mails.
#[derive(Debug, Clone)]
pub struct AuthService {
    store: PostgresPersistence,
    mailer: Arc<dyn Mailer>,
    session_ttl: Duration,
    password_token_ttl: Duration,
    ui_url: String,
    mail_from: String,
}

impl AuthService {
    /// Creates a new `AuthService`.
    #[must_use]
    pub fn new(store: PostgresPersistence, mailer: Arc<dyn Mailer>, config: &LeagueConfig) -> Self {
        Self {
            store,
            mailer,
            session_ttl: seconds(config.session_ttl_secs),
            password_token_ttl: seconds(config.password_token_ttl_secs),
            ui_url: config.ui_url.trim_end_matches('/').to_string(),
            mail_from: config.mail_from.clone(),
        }
    }

    /// Verifies credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidCredentials`] if the account does not
    /// exist, is archived, has no password yet or the password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, LeagueError> {
        let username = username.trim().to_lowercase();
        let credentials = self
            .store
            .find_credentials_by_username(&username)
            .await?
            .ok_or(LeagueError::InvalidCredentials)?;
        let verified = credentials
            .password_hash
            .as_deref()
            .is_some_and(|phc| verify_password(password, phc));
        if !verified {
            tracing::info!(%username, "login rejected");
            return Err(LeagueError::InvalidCredentials);
        }

        let account = credentials.account;
        let (token, expires_at) = self.open_session(account.identity().id).await?;
        tracing::info!(account_id = %account.identity().id, role = %account.role(), "login");
        Ok(LoginOutcome {
            token,
            expires_at,
            account,
        })
    }

    /// Resolves a bearer token into the calling principal.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidToken`] for an unknown or expired
    /// token.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, LeagueError> {
        self.store
            .find_session_principal(&hash_token(token), Utc::now())
            .await?
            .ok_or(LeagueError::InvalidToken)
    }

    /// Revokes the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidToken`] if no such session exists.
    pub async fn logout(&self, token: &str) -> Result<(), LeagueError> {
        if !self.store.delete_session(&hash_token(token)).await? {
            return Err(LeagueError::InvalidToken);
        }
        tracing::info!("logout");
        Ok(())
    }

    /// Replaces the session behind `token` with a new one.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidToken`] if `token` is not a live
    /// session of `principal`.
    pub async fn refresh_session(
        &self,
        principal: &Principal,
        token: &str,
    ) -> Result<(String, DateTime<Utc>), LeagueError> {
        if !self.store.delete_session(&hash_token(token)).await? {
            return Err(LeagueError::InvalidToken);
        }
        let refreshed = self.open_session(principal.account_id).await?;
        tracing::info!(account_id = %principal.account_id, "session refreshed");
        Ok(refreshed)
    }

    /// Creates a fresh password token. Nothing is stored yet.
    #[must_use]
    pub fn issue_password_token(&self, purpose: TokenPurpose) -> IssuedPasswordToken {
        let token = generate_token();
        IssuedPasswordToken {
            record: PasswordTokenRecord {
                token_hash: hash_token(&token),
                purpose,
                expires_at: Utc::now() + self.password_token_ttl,
            },
            token,
        }
    }

    /// Link embedded in password mails.
    #[must_use]
    pub fn password_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.ui_url)
    }

    /// Mails the setup link of a freshly created account. Returns whether
    /// the mail was handed off; failures are logged, not propagated.
    pub fn send_setup_mail(&self, email: &str, account_name: &str, token: &str) -> bool {
        let message = MailMessage::password_setup(
            &self.mail_from,
            email,
            account_name,
            &self.password_link(token),
        );
        match self.mailer.send(&message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, to = email, "password setup mail failed");
                false
            }
        }
    }

    /// Creates an admin account and mails its setup link.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Conflict`] if the username is taken.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
    ) -> Result<(AccountId, bool), LeagueError> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();
        let id = AccountId::new();
        let issued = self.issue_password_token(TokenPurpose::Setup);

        self.store
            .create_admin(id, &username, &email, &issued.record)
            .await?;
        tracing::info!(account_id = %id, %username, "admin created");

        let mailed = self.send_setup_mail(&email, &username, &issued.token);
        Ok((id, mailed))
    }

    /// Creates the configured admin when the database has none.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError`] if the lookup or insert fails.
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<AccountId>, LeagueError> {
        if self.store.admin_exists().await? {
            return Ok(None);
        }
        let (id, _) = self.create_admin(username, email).await?;
        tracing::info!(account_id = %id, "bootstrap admin created");
        Ok(Some(id))
    }

    /// Mails a reset link to the account matching both email and username.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] if no active account matches, or
    /// [`LeagueError::Internal`] if the mail cannot be sent.
    pub async fn request_password_reset(
        &self,
        email: &str,
        username: &str,
    ) -> Result<(), LeagueError> {
        let email = email.trim().to_lowercase();
        let username = username.trim().to_lowercase();
        let account = self
            .store
            .find_account_by_email_and_username(&email, &username)
            .await?
            .ok_or_else(|| LeagueError::not_found("account", &username))?;

        let issued = self.issue_password_token(TokenPurpose::Reset);
        let account_id = account.identity().id;
        self.store
            .store_password_token(account_id, &issued.record)
            .await?;

        let message = MailMessage::password_reset(
            &self.mail_from,
            &account.identity().email,
            &username,
            &self.password_link(&issued.token),
        );
        self.mailer.send(&message)?;
        tracing::info!(%account_id, "password reset requested");
        Ok(())
    }

    /// Reports whether a password token can still be used.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn password_token_is_valid(&self, token: &str) -> Result<bool, LeagueError> {
        self.store
            .password_token_is_valid(&hash_token(token), Utc::now())
            .await
    }

    /// Consumes a password token and sets the new password.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidPasswordToken`] if the token is
    /// unknown, expired or already used.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), LeagueError> {
        let phc = hash_password(new_password)?;
        let account_id = self
            .store
            .consume_password_token(&hash_token(token), &phc, Utc::now())
            .await?;
        tracing::info!(%account_id, "password set via token");
        Ok(())
    }

    /// Changes the caller's password after checking the old one.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidCredentials`] if the old password
    /// does not match.
    pub async fn change_password(
        &self,
        principal: &Principal,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), LeagueError> {
        let credentials = self
            .store
            .find_credentials(principal.account_id)
            .await?
            .ok_or(LeagueError::InvalidCredentials)?;
        let verified = credentials
            .password_hash
            .as_deref()
            .is_some_and(|phc| verify_password(old_password, phc));
        if !verified {
            return Err(LeagueError::InvalidCredentials);
        }

        self.store
            .set_password(principal.account_id, &hash_password(new_password)?)
            .await?;
        tracing::info!(account_id = %principal.account_id, "password changed");
        Ok(())
    }

    async fn open_session(
        &self,
        account_id: AccountId,
    ) -> Result<(String, DateTime<Utc>), LeagueError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.session_ttl;
        self.store
            .insert_session(&hash_token(&token), account_id, expires_at)
            .await?;
        Ok((token, expires_at))
    }
}

/// Fails with [`LeagueError::Forbidden`] unless the principal is an admin.
///
/// # Errors
///
/// Returns [`LeagueError::Forbidden`] for team principals.
pub fn authorize_admin(principal: &Principal) -> Result<(), LeagueError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(LeagueError::Forbidden("admins only".to_string()))
    }
}

/// Longest accepted lifetime for sessions and password tokens.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs.min(MAX_TTL_SECS)).unwrap_or_default())
}
