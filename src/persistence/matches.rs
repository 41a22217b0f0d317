//! Match headers, quarter sheets and overtime.
//!
//! Every multi-statement write runs in one transaction. The header row is
//! locked with `SELECT ... FOR UPDATE` before its status is checked, and
//! every `UPDATE` must hit exactly one row or the whole write rolls back.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::{MatchRow, OvertimeRow, QuarterRow, SheetColumns, parse_status};
use super::postgres::{PostgresPersistence, expect_one_row};
use crate::domain::{
    AccountId, MatchDetail, MatchHeader, MatchId, MatchStatus, MatchUpdate, NewMatch, Overtime,
    QuarterDetail, TeamLineup,
};
use crate::error::{LeagueError, persistence};

const MATCH_HEADER: &str = "SELECT m.id, m.season_id, m.created_at, m.created_by, \
     m.home_team, COALESCE(h.team_name, h.username) AS home_team_name, m.home_captain, \
     m.guest_team, COALESCE(g.team_name, g.username) AS guest_team_name, m.guest_captain, \
     m.match_location, m.match_date, m.status, m.status_changed_at, m.status_changed_by \
     FROM matches m \
     JOIN users h ON h.id = m.home_team \
     JOIN users g ON g.id = m.guest_team";

const SHEET_COLUMNS: &str =
    "guest_positions, home_positions, guest_legs, home_legs, guest_score, home_score";

impl PostgresPersistence {
    /// Inserts a match header and its four seeded quarter rows in one
    /// transaction. The match joins the active season, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] if a team is unknown or
    /// archived, a [`LeagueError::Validation`] if a captain does not play
    /// for their team, or a [`LeagueError::Persistence`] if any insert
    /// fails.
    pub async fn create_match(&self, id: MatchId, new: &NewMatch) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for lineup in [&new.home, &new.guest] {
            if let Err(e) = check_lineup(&mut tx, lineup).await {
                tx.rollback().await.map_err(persistence)?;
                return Err(e);
            }
        }

        let season_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM seasons WHERE is_active LIMIT 1")
                .fetch_optional(&mut *tx)
                .await
                .map_err(persistence)?;

        let result = sqlx::query(
            "INSERT INTO matches (id, season_id, created_at, created_by, home_team, \
             home_captain, guest_team, guest_captain, match_location, match_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id.as_uuid())
        .bind(season_id)
        .bind(new.created_at)
        .bind(new.created_by.as_uuid())
        .bind(new.home.team.as_uuid())
        .bind(new.home.captain.as_uuid())
        .bind(new.guest.team.as_uuid())
        .bind(new.guest.captain.as_uuid())
        .bind(&new.location)
        .bind(new.match_date)
        .bind(MatchStatus::New.as_str())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        expect_one_row(&result, "insert match")?;

        for detail in new.seeded_quarters() {
            let guest = SheetColumns::new(&detail.guest)?;
            let home = SheetColumns::new(&detail.home)?;
            let result = sqlx::query(&format!(
                "INSERT INTO match_details (match_id, quarter, {SHEET_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            ))
            .bind(id.as_uuid())
            .bind(i16::from(detail.quarter))
            .bind(guest.positions)
            .bind(home.positions)
            .bind(guest.legs)
            .bind(home.legs)
            .bind(guest.score)
            .bind(home.score)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
            expect_one_row(&result, &format!("insert quarter {}", detail.quarter))?;
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Lists match headers by date, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn list_matches(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MatchHeader>, i64), LeagueError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "{MATCH_HEADER} ORDER BY m.match_date DESC, m.id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await
            .map_err(persistence)?;

        let headers = rows
            .into_iter()
            .map(MatchHeader::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((headers, total))
    }

    /// Loads a match header.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn match_header(&self, id: MatchId) -> Result<Option<MatchHeader>, LeagueError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!("{MATCH_HEADER} WHERE m.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?;
        row.map(MatchHeader::try_from).transpose()
    }

    /// Loads a match with its quarters and overtime.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn get_match(&self, id: MatchId) -> Result<Option<MatchDetail>, LeagueError> {
        let Some(header) = self.match_header(id).await? else {
            return Ok(None);
        };

        let quarters = sqlx::query_as::<_, QuarterRow>(&format!(
            "SELECT quarter, {SHEET_COLUMNS} FROM match_details \
             WHERE match_id = $1 ORDER BY quarter"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?
        .into_iter()
        .map(QuarterDetail::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let overtime = sqlx::query_as::<_, OvertimeRow>(&format!(
            "SELECT {SHEET_COLUMNS} FROM match_overtimes WHERE match_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?
        .map(Overtime::try_from)
        .transpose()?;

        Ok(Some(MatchDetail {
            header,
            quarters,
            overtime,
        }))
    }

    /// Replaces the status and all four quarter sheets of a match in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown match, a
    /// [`LeagueError::Conflict`] if the match is finished or the status
    /// change is not allowed, or a [`LeagueError::Persistence`] naming the
    /// step whose write did not affect exactly one row.
    pub async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let current = match lock_status(&mut tx, id).await {
            Ok(status) => status,
            Err(e) => {
                tx.rollback().await.map_err(persistence)?;
                return Err(e);
            }
        };
        if !current.can_update_to(update.status) {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::Conflict(format!(
                "match {id} cannot change from {current} to {}",
                update.status
            )));
        }

        let result = sqlx::query(
            "UPDATE matches SET status = $2, status_changed_at = now(), status_changed_by = $3 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(update.status.as_str())
        .bind(update.changed_by.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if let Err(e) = expect_one_row(&result, "update match header") {
            tx.rollback().await.map_err(persistence)?;
            return Err(e);
        }

        for detail in &update.quarters {
            let guest = SheetColumns::new(&detail.guest)?;
            let home = SheetColumns::new(&detail.home)?;
            let result = sqlx::query(
                "UPDATE match_details SET guest_positions = $3, home_positions = $4, \
                 guest_legs = $5, home_legs = $6, guest_score = $7, home_score = $8 \
                 WHERE match_id = $1 AND quarter = $2",
            )
            .bind(id.as_uuid())
            .bind(i16::from(detail.quarter))
            .bind(guest.positions)
            .bind(home.positions)
            .bind(guest.legs)
            .bind(home.legs)
            .bind(guest.score)
            .bind(home.score)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
            if let Err(e) =
                expect_one_row(&result, &format!("update quarter {}", detail.quarter))
            {
                tx.rollback().await.map_err(persistence)?;
                return Err(e);
            }
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Moves a finished match back to `REOPENED`.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown match, a
    /// [`LeagueError::Conflict`] unless the match is finished, or a
    /// [`LeagueError::Persistence`] if the header update misses.
    pub async fn reopen_match(
        &self,
        id: MatchId,
        by: AccountId,
        at: DateTime<Utc>,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let current = match lock_status(&mut tx, id).await {
            Ok(status) => status,
            Err(e) => {
                tx.rollback().await.map_err(persistence)?;
                return Err(e);
            }
        };
        if !current.can_reopen() {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::Conflict(format!(
                "match {id} is {current}, only finished matches can be reopened"
            )));
        }

        let result = sqlx::query(
            "UPDATE matches SET status = $2, status_changed_at = $3, status_changed_by = $4 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(MatchStatus::Reopened.as_str())
        .bind(at)
        .bind(by.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if let Err(e) = expect_one_row(&result, "reopen match") {
            tx.rollback().await.map_err(persistence)?;
            return Err(e);
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Stores the overtime sheet of an editable match.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown match or a
    /// [`LeagueError::Conflict`] if the match is finished or already has
    /// an overtime sheet.
    pub async fn create_overtime(
        &self,
        id: MatchId,
        overtime: &Overtime,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        if let Err(e) = lock_editable(&mut tx, id).await {
            tx.rollback().await.map_err(persistence)?;
            return Err(e);
        }

        let guest = SheetColumns::new(&overtime.guest)?;
        let home = SheetColumns::new(&overtime.home)?;
        let result = sqlx::query(&format!(
            "INSERT INTO match_overtimes (match_id, {SHEET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (match_id) DO NOTHING"
        ))
        .bind(id.as_uuid())
        .bind(guest.positions)
        .bind(home.positions)
        .bind(guest.legs)
        .bind(home.legs)
        .bind(guest.score)
        .bind(home.score)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::Conflict(format!(
                "match {id} already has an overtime"
            )));
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Replaces the overtime sheet of an editable match.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown match or a
    /// missing overtime sheet, or a [`LeagueError::Conflict`] if the match
    /// is finished.
    pub async fn update_overtime(
        &self,
        id: MatchId,
        overtime: &Overtime,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        if let Err(e) = lock_editable(&mut tx, id).await {
            tx.rollback().await.map_err(persistence)?;
            return Err(e);
        }

        let guest = SheetColumns::new(&overtime.guest)?;
        let home = SheetColumns::new(&overtime.home)?;
        let result = sqlx::query(
            "UPDATE match_overtimes SET guest_positions = $2, home_positions = $3, \
             guest_legs = $4, home_legs = $5, guest_score = $6, home_score = $7 \
             WHERE match_id = $1",
        )
        .bind(id.as_uuid())
        .bind(guest.positions)
        .bind(home.positions)
        .bind(guest.legs)
        .bind(home.legs)
        .bind(guest.score)
        .bind(home.score)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::not_found("overtime", id));
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }
}

/// Locks the match header and returns its current status.
async fn lock_status(
    tx: &mut Transaction<'_, Postgres>,
    id: MatchId,
) -> Result<MatchStatus, LeagueError> {
    let status =
        sqlx::query_scalar::<_, String>("SELECT status FROM matches WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(persistence)?;
    let Some(status) = status else {
        return Err(LeagueError::not_found("match", id));
    };
    parse_status(&status)
}

async fn lock_editable(tx: &mut Transaction<'_, Postgres>, id: MatchId) -> Result<(), LeagueError> {
    let status = lock_status(tx, id).await?;
    if !status.is_editable() {
        return Err(LeagueError::Conflict(format!("match {id} is finished")));
    }
    Ok(())
}

/// Checks that the team is active and the captain plays for it.
async fn check_lineup(
    tx: &mut Transaction<'_, Postgres>,
    lineup: &TeamLineup,
) -> Result<(), LeagueError> {
    let team_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users \
         WHERE id = $1 AND role = 'TEAM' AND archived_at IS NULL)",
    )
    .bind(lineup.team.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(persistence)?;
    if !team_exists {
        return Err(LeagueError::not_found("team", lineup.team));
    }

    let captain_plays = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM players \
         WHERE id = $1 AND user_id = $2 AND archived_at IS NULL)",
    )
    .bind(lineup.captain.as_uuid())
    .bind(lineup.team.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(persistence)?;
    if !captain_plays {
        return Err(LeagueError::Validation(format!(
            "captain {} does not play for team {}",
            lineup.captain, lineup.team
        )));
    }
    Ok(())
}
