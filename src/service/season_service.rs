//! Season service.

use chrono::Utc;

use super::auth_service::authorize_admin;
use crate::domain::{Principal, Season, SeasonId};
use crate::error::LeagueError;
use crate::persistence::PostgresPersistence;

/// Creates seasons and switches the active one.
#[derive(Debug, Clone)]
pub struct SeasonService {
    store: PostgresPersistence,
}

impl SeasonService {
    /// Creates a new `SeasonService`.
    #[must_use]
    pub fn new(store: PostgresPersistence) -> Self {
        Self { store }
    }

    /// Lists seasons, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn list_seasons(&self) -> Result<Vec<Season>, LeagueError> {
        self.store.list_seasons().await
    }

    /// Creates an inactive season.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin.
    pub async fn create_season(
        &self,
        principal: &Principal,
        name: &str,
    ) -> Result<Season, LeagueError> {
        authorize_admin(principal)?;
        let season = self
            .store
            .create_season(SeasonId::new(), name.trim(), Utc::now(), principal.account_id)
            .await?;
        tracing::info!(season_id = %season.id, name = %season.name, "season created");
        Ok(season)
    }

    /// Makes `id` the only active season.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin,
    /// or [`LeagueError::NotFound`] for an unknown season, in which case
    /// the previously active season stays active.
    pub async fn activate_season(
        &self,
        principal: &Principal,
        id: SeasonId,
    ) -> Result<(), LeagueError> {
        authorize_admin(principal)?;
        self.store.set_active_season(id).await?;
        tracing::info!(season_id = %id, "season activated");
        Ok(())
    }
}
