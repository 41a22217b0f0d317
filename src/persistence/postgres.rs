//! PostgreSQL implementation of the persistence layer.
//!
//! The store methods themselves live next to their tables in the sibling
//! modules; this file holds the connection handling and the helpers they
//! share.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};

use crate::config::LeagueConfig;
use crate::error::{LeagueError, persistence};

/// Migrations embedded at compile time from `./migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pub(super) pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] if the database cannot be
    /// reached within the connect timeout.
    pub async fn connect(config: &LeagueConfig) -> Result<Self, LeagueError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(persistence)?;
        Ok(Self::new(pool))
    }

    /// Builds a pool that connects on first use. Used where a handle is
    /// needed before the database is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] if the URL cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, LeagueError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(database_url)
            .map_err(persistence)?;
        Ok(Self::new(pool))
    }

    /// Applies pending embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LeagueError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| LeagueError::Persistence(e.to_string()))
    }

    /// Round-trips a trivial query.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] if the database is unreachable.
    pub async fn ping(&self) -> Result<(), LeagueError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

/// Checks that a write inside a transaction touched exactly one row.
///
/// # Errors
///
/// Returns a [`LeagueError::Persistence`] naming `step` otherwise.
pub(super) fn expect_one_row(result: &PgQueryResult, step: &str) -> Result<(), LeagueError> {
    match result.rows_affected() {
        1 => Ok(()),
        n => Err(LeagueError::Persistence(format!(
            "{step}: expected 1 row affected, got {n}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_embedded() {
        assert!(MIGRATOR.iter().any(|m| m.version == 1));
    }

    #[tokio::test]
    async fn lazy_pool_rejects_garbage_url() {
        assert!(matches!(
            PostgresPersistence::connect_lazy("not a url"),
            Err(LeagueError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        assert!(PostgresPersistence::connect_lazy("postgres://nobody@127.0.0.1:1/none").is_ok());
    }
}
