//! Accounts, login sessions and password tokens.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{UserRow, parse_role};
use super::postgres::{PostgresPersistence, expect_one_row};
use crate::domain::{Account, AccountId, Principal, Role};
use crate::error::{LeagueError, persistence};

const USER_COLUMNS: &str =
    "id, username, user_email, team_name, role, password, archived_at";

/// Purpose of a password token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// First password of a freshly created account.
    Setup,
    /// Forgotten-password reset.
    Reset,
}

impl TokenPurpose {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Reset => "RESET",
        }
    }
}

/// A password token to be stored alongside a new or existing account.
#[derive(Debug, Clone)]
pub struct PasswordTokenRecord {
    /// SHA-256 hex digest of the token.
    pub token_hash: String,
    /// Setup or reset.
    pub purpose: TokenPurpose,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

/// A stored account together with its password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The account.
    pub account: Account,
    /// Argon2 PHC string, if a password has been set.
    pub password_hash: Option<String>,
}

impl TryFrom<UserRow> for Credentials {
    type Error = LeagueError;

    fn try_from(mut row: UserRow) -> Result<Self, Self::Error> {
        let password_hash = row.password.take();
        Ok(Self {
            account: row.into_account()?,
            password_hash,
        })
    }
}

impl PostgresPersistence {
    /// Loads a non-archived account by lowercased username.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credentials>, LeagueError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND archived_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        row.map(Credentials::try_from).transpose()
    }

    /// Loads a non-archived account by id.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn find_credentials(
        &self,
        id: AccountId,
    ) -> Result<Option<Credentials>, LeagueError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND archived_at IS NULL"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        row.map(Credentials::try_from).transpose()
    }

    /// Loads a non-archived account matching both email and username.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn find_account_by_email_and_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>, LeagueError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE user_email = $1 AND username = $2 AND archived_at IS NULL"
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;
        row.map(UserRow::into_account).transpose()
    }

    /// Returns `true` if any account, archived or not, uses `username`.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn username_exists(&self, username: &str) -> Result<bool, LeagueError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(persistence)
    }

    /// Returns `true` if at least one active admin exists.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn admin_exists(&self) -> Result<bool, LeagueError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'ADMIN' AND archived_at IS NULL)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)
    }

    /// Inserts an admin account and its setup token in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Conflict`] if the username is taken, or a
    /// [`LeagueError::Persistence`] on database failure.
    pub async fn create_admin(
        &self,
        id: AccountId,
        username: &str,
        email: &str,
        token: &PasswordTokenRecord,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let result = sqlx::query(
            "INSERT INTO users (id, username, user_email, role) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(username)
        .bind(email)
        .bind(Role::Admin.as_str())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::Conflict(format!(
                "username {username} is already taken"
            )));
        }

        let result = insert_password_token(&mut tx, id, token).await?;
        expect_one_row(&result, "insert password token")?;

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Stores a login session.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn insert_session(
        &self,
        token_hash: &str,
        account_id: AccountId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), LeagueError> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(account_id.as_uuid())
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }

    /// Resolves an unexpired session of a non-archived account.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn find_session_principal(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Principal>, LeagueError> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT u.id, u.role FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token_hash = $1 AND s.expires_at > $2 AND u.archived_at IS NULL",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(|(id, role)| {
            Ok(Principal {
                account_id: id.into(),
                role: parse_role(&role)?,
            })
        })
        .transpose()
    }

    /// Deletes a session. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool, LeagueError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores a password token for an existing account.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn store_password_token(
        &self,
        account_id: AccountId,
        token: &PasswordTokenRecord,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;
        insert_password_token(&mut tx, account_id, token).await?;
        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Returns `true` if the token is unconsumed and unexpired.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn password_token_is_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, LeagueError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM password_tokens \
             WHERE token_hash = $1 AND consumed_at IS NULL AND expires_at > $2)",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)
    }

    /// Consumes a password token and sets the owner's password. All of the
    /// owner's sessions are revoked.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::InvalidPasswordToken`] if the token is
    /// unknown, expired or already consumed, or a
    /// [`LeagueError::Persistence`] on database failure.
    pub async fn consume_password_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<AccountId, LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let owner = sqlx::query_scalar::<_, Uuid>(
            "UPDATE password_tokens SET consumed_at = $2 \
             WHERE token_hash = $1 AND consumed_at IS NULL AND expires_at > $2 \
             RETURNING user_id",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(persistence)?;
        let Some(owner) = owner else {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::InvalidPasswordToken);
        };

        let result =
            sqlx::query("UPDATE users SET password = $2 WHERE id = $1 AND archived_at IS NULL")
                .bind(owner)
                .bind(password_hash)
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::InvalidPasswordToken);
        }

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        tx.commit().await.map_err(persistence)?;
        Ok(owner.into())
    }

    /// Replaces the password of an active account.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] if the account does not exist
    /// or is archived.
    pub async fn set_password(
        &self,
        account_id: AccountId,
        password_hash: &str,
    ) -> Result<(), LeagueError> {
        let result =
            sqlx::query("UPDATE users SET password = $2 WHERE id = $1 AND archived_at IS NULL")
                .bind(account_id.as_uuid())
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map_err(persistence)?;
        if result.rows_affected() == 0 {
            return Err(LeagueError::not_found("account", account_id));
        }
        Ok(())
    }
}

/// Inserts a password token inside an open transaction.
pub(super) async fn insert_password_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: AccountId,
    token: &PasswordTokenRecord,
) -> Result<sqlx::postgres::PgQueryResult, LeagueError> {
    sqlx::query(
        "INSERT INTO password_tokens (token_hash, user_id, purpose, expires_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(&token.token_hash)
    .bind(account_id.as_uuid())
    .bind(token.purpose.as_str())
    .bind(token.expires_at)
    .execute(&mut **tx)
    .await
    .map_err(persistence)
}
