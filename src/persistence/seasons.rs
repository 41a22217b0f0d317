//! Seasons and the standings source query.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{SeasonRow, StandingsDbRow};
use super::postgres::{PostgresPersistence, expect_one_row};
use crate::domain::{AccountId, Season, SeasonId, StandingsRow};
use crate::error::{LeagueError, persistence};

/// Every active team, left-joined with each quarter of every finished
/// match it played in the active season (or in any season while none is
/// active). Rows come grouped by team, then match date descending, then
/// quarter ascending.
const STANDINGS_ROWS: &str = "SELECT u.id AS team_id, \
         COALESCE(u.team_name, u.username) AS team_name, \
         m.id AS match_id, m.match_date, m.status, \
         m.home_team, COALESCE(h.team_name, h.username) AS home_team_name, \
         m.guest_team, COALESCE(g.team_name, g.username) AS guest_team_name, \
         m.match_location, \
         d.quarter, d.guest_legs, d.home_legs, d.guest_score, d.home_score, \
         o.guest_score AS ot_guest_score, o.home_score AS ot_home_score \
     FROM users u \
     LEFT JOIN matches m ON (m.home_team = u.id OR m.guest_team = u.id) \
         AND m.status = 'FINISHED' \
         AND (NOT EXISTS (SELECT 1 FROM seasons WHERE is_active) \
              OR m.season_id = (SELECT id FROM seasons WHERE is_active LIMIT 1)) \
     LEFT JOIN users h ON h.id = m.home_team \
     LEFT JOIN users g ON g.id = m.guest_team \
     LEFT JOIN match_details d ON d.match_id = m.id \
     LEFT JOIN match_overtimes o ON o.match_id = m.id \
     WHERE u.role = 'TEAM' AND u.archived_at IS NULL \
     ORDER BY u.id, m.match_date DESC, m.id, d.quarter ASC";

impl PostgresPersistence {
    /// Lists all seasons, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn list_seasons(&self) -> Result<Vec<Season>, LeagueError> {
        let rows = sqlx::query_as::<_, SeasonRow>(
            "SELECT id, name, created_at, created_by, is_active FROM seasons \
             ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(rows.into_iter().map(Season::from).collect())
    }

    /// Inserts an inactive season.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn create_season(
        &self,
        id: SeasonId,
        name: &str,
        created_at: DateTime<Utc>,
        created_by: AccountId,
    ) -> Result<Season, LeagueError> {
        let row = sqlx::query_as::<_, SeasonRow>(
            "INSERT INTO seasons (id, name, created_at, created_by, is_active) \
             VALUES ($1, $2, $3, $4, false) \
             RETURNING id, name, created_at, created_by, is_active",
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(created_at)
        .bind(created_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(row.into())
    }

    /// Makes `id` the only active season. Clearing and setting happen in
    /// one transaction, so an unknown id leaves the current flags intact.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] if the season does not exist.
    pub async fn set_active_season(&self, id: SeasonId) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM seasons WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(persistence)?;
        if exists.is_none() {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::not_found("season", id));
        }

        sqlx::query("UPDATE seasons SET is_active = false WHERE is_active")
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        let result = sqlx::query("UPDATE seasons SET is_active = true WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        if let Err(e) = expect_one_row(&result, "activate season") {
            tx.rollback().await.map_err(persistence)?;
            return Err(e);
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Loads the rows folded by the standings aggregator.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure or on a
    /// row that cannot be converted.
    pub async fn standings_rows(&self) -> Result<Vec<StandingsRow>, LeagueError> {
        sqlx::query_as::<_, StandingsDbRow>(STANDINGS_ROWS)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?
            .into_iter()
            .map(StandingsRow::try_from)
            .collect()
    }
}
