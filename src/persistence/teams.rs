//! Teams and their players.

use indexmap::IndexMap;
use uuid::Uuid;

use super::accounts::{PasswordTokenRecord, insert_password_token};
use super::models::{PlayerRow, TeamPlayerRow};
use super::postgres::{PostgresPersistence, expect_one_row};
use crate::domain::{NewTeam, Player, PlayerId, Role, Team, TeamId, TeamUpdate};
use crate::error::{LeagueError, persistence};

const TEAM_PLAYERS: &str = "SELECT u.id AS team_id, COALESCE(u.team_name, u.username) AS team_name, \
     u.username, u.user_email AS team_email, u.archived_at AS team_archived_at, \
     p.id AS player_id, p.name AS player_name, p.player_order \
     FROM users u LEFT JOIN players p ON p.user_id = u.id AND p.archived_at IS NULL \
     WHERE u.role = 'TEAM'";

const TEAM_PLAYERS_ORDER: &str = "ORDER BY COALESCE(u.team_name, u.username) ASC, u.id, \
     p.player_order ASC, p.name ASC";

impl PostgresPersistence {
    /// Lists teams with their active players, ordered by team name.
    /// Archived teams are included only when `include_archived` is set.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn list_teams(&self, include_archived: bool) -> Result<Vec<Team>, LeagueError> {
        let rows = sqlx::query_as::<_, TeamPlayerRow>(&format!(
            "{TEAM_PLAYERS} AND ($1 OR u.archived_at IS NULL) {TEAM_PLAYERS_ORDER}"
        ))
        .bind(include_archived)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(group_teams(rows))
    }

    /// Loads one team, archived or not.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn get_team(&self, id: TeamId) -> Result<Option<Team>, LeagueError> {
        let rows = sqlx::query_as::<_, TeamPlayerRow>(&format!(
            "{TEAM_PLAYERS} AND u.id = $1 {TEAM_PLAYERS_ORDER}"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(group_teams(rows).into_iter().next())
    }

    /// Inserts a team account, its initial players and its setup token in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Conflict`] if the username is taken, or a
    /// [`LeagueError::Persistence`] on database failure.
    pub async fn create_team(
        &self,
        team: &NewTeam,
        token: &PasswordTokenRecord,
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let result = sqlx::query(
            "INSERT INTO users (id, username, user_email, team_name, role) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (username) DO NOTHING",
        )
        .bind(team.id.as_uuid())
        .bind(&team.username)
        .bind(&team.email)
        .bind(&team.team_name)
        .bind(Role::Team.as_str())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::Conflict(format!(
                "username {} is already taken",
                team.username
            )));
        }

        for (order, name) in team.players.iter().enumerate() {
            let result = sqlx::query(
                "INSERT INTO players (id, name, user_id, player_order) VALUES ($1, $2, $3, $4)",
            )
            .bind(PlayerId::new().as_uuid())
            .bind(name)
            .bind(team.id.as_uuid())
            .bind(roster_position(order)?)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
            expect_one_row(&result, "insert player")?;
        }

        let result = insert_password_token(&mut tx, team.id, token).await?;
        expect_one_row(&result, "insert password token")?;

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Replaces a team's name, email and roster in one transaction.
    ///
    /// Roster lines with an id must name an active player of this team;
    /// lines without one are inserted. Active players not listed are
    /// archived.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown team or player,
    /// or a [`LeagueError::Persistence`] on database failure.
    pub async fn update_team(&self, id: TeamId, update: &TeamUpdate) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        if !lock_active_team(&mut tx, id).await? {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::not_found("team", id));
        }

        let result = sqlx::query("UPDATE users SET team_name = $2, user_email = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&update.team_name)
            .bind(&update.email)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        expect_one_row(&result, "update team")?;

        let mut kept: Vec<Uuid> = Vec::with_capacity(update.roster.len());
        for (order, entry) in update.roster.iter().enumerate() {
            let position = roster_position(order)?;
            match entry.id {
                Some(player_id) => {
                    let result = sqlx::query(
                        "UPDATE players SET name = $3, player_order = $4 \
                         WHERE id = $1 AND user_id = $2 AND archived_at IS NULL",
                    )
                    .bind(player_id.as_uuid())
                    .bind(id.as_uuid())
                    .bind(&entry.name)
                    .bind(position)
                    .execute(&mut *tx)
                    .await
                    .map_err(persistence)?;
                    if result.rows_affected() == 0 {
                        tx.rollback().await.map_err(persistence)?;
                        return Err(LeagueError::not_found("player", player_id));
                    }
                    kept.push(*player_id.as_uuid());
                }
                None => {
                    let player_id = PlayerId::new();
                    let result = sqlx::query(
                        "INSERT INTO players (id, name, user_id, player_order) \
                         VALUES ($1, $2, $3, $4)",
                    )
                    .bind(player_id.as_uuid())
                    .bind(&entry.name)
                    .bind(id.as_uuid())
                    .bind(position)
                    .execute(&mut *tx)
                    .await
                    .map_err(persistence)?;
                    expect_one_row(&result, "insert player")?;
                    kept.push(*player_id.as_uuid());
                }
            }
        }

        sqlx::query(
            "UPDATE players SET archived_at = now() \
             WHERE user_id = $1 AND archived_at IS NULL AND NOT (id = ANY($2))",
        )
        .bind(id.as_uuid())
        .bind(&kept)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Archives a team and revokes its sessions.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] if no active team has this id.
    pub async fn archive_team(&self, id: TeamId) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let result = sqlx::query(
            "UPDATE users SET archived_at = now() \
             WHERE id = $1 AND role = 'TEAM' AND archived_at IS NULL",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;
        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::not_found("team", id));
        }

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    /// Appends a player to the end of an active team's roster.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] if no active team has this id.
    pub async fn add_player(&self, team_id: TeamId, name: &str) -> Result<Player, LeagueError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            "INSERT INTO players (id, name, user_id, player_order) \
             SELECT $1, $2, u.id, COALESCE( \
                 (SELECT MAX(p.player_order) + 1 FROM players p \
                  WHERE p.user_id = u.id AND p.archived_at IS NULL), 0) \
             FROM users u WHERE u.id = $3 AND u.role = 'TEAM' AND u.archived_at IS NULL \
             RETURNING id, name, user_id, player_order, archived_at",
        )
        .bind(PlayerId::new().as_uuid())
        .bind(name)
        .bind(team_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(Player::from)
            .ok_or_else(|| LeagueError::not_found("team", team_id))
    }

    /// Rewrites `player_order` to follow `order`, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::NotFound`] for an unknown team or for a
    /// player that is not an active member of it.
    pub async fn set_player_order(
        &self,
        team_id: TeamId,
        order: &[PlayerId],
    ) -> Result<(), LeagueError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        if !lock_active_team(&mut tx, team_id).await? {
            tx.rollback().await.map_err(persistence)?;
            return Err(LeagueError::not_found("team", team_id));
        }

        for (position, player_id) in order.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE players SET player_order = $3 \
                 WHERE id = $1 AND user_id = $2 AND archived_at IS NULL",
            )
            .bind(player_id.as_uuid())
            .bind(team_id.as_uuid())
            .bind(roster_position(position)?)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
            if result.rows_affected() == 0 {
                tx.rollback().await.map_err(persistence)?;
                return Err(LeagueError::not_found("player", player_id));
            }
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }
}

async fn lock_active_team(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: TeamId,
) -> Result<bool, LeagueError> {
    let locked = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM users WHERE id = $1 AND role = 'TEAM' AND archived_at IS NULL FOR UPDATE",
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(persistence)?;
    Ok(locked.is_some())
}

fn roster_position(index: usize) -> Result<i32, LeagueError> {
    i32::try_from(index).map_err(|_| LeagueError::Validation("roster is too long".to_string()))
}

/// Folds team/player join rows into teams, keeping the query order.
fn group_teams(rows: Vec<TeamPlayerRow>) -> Vec<Team> {
    let mut teams: IndexMap<Uuid, Team> = IndexMap::new();
    for row in rows {
        let team = teams.entry(row.team_id).or_insert_with(|| Team {
            id: row.team_id.into(),
            team_name: row.team_name.clone(),
            username: row.username.clone(),
            team_email: row.team_email.clone(),
            archived_at: row.team_archived_at,
            players: Vec::new(),
        });
        if let (Some(id), Some(name)) = (row.player_id, row.player_name) {
            team.players.push(Player {
                id: id.into(),
                name,
                team_id: row.team_id.into(),
                player_order: row.player_order.unwrap_or_default(),
                archived_at: None,
            });
        }
    }
    teams.into_values().collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn row(team_id: Uuid, team_name: &str, player: Option<(&str, i32)>) -> TeamPlayerRow {
        TeamPlayerRow {
            team_id,
            team_name: team_name.to_string(),
            username: team_name.to_lowercase(),
            team_email: format!("{}@example.com", team_name.to_lowercase()),
            team_archived_at: None,
            player_id: player.map(|_| Uuid::new_v4()),
            player_name: player.map(|(name, _)| name.to_string()),
            player_order: player.map(|(_, order)| order),
        }
    }

    #[test]
    fn groups_players_under_their_team_in_query_order() {
        let arrows = Uuid::new_v4();
        let bulls = Uuid::new_v4();
        let teams = group_teams(vec![
            row(arrows, "Arrows", Some(("Ann", 0))),
            row(arrows, "Arrows", Some(("Bob", 1))),
            row(bulls, "Bulls", None),
        ]);

        let [first, second] = teams.as_slice() else {
            panic!("expected two teams, got {}", teams.len());
        };
        assert_eq!(first.team_name, "Arrows");
        let names: Vec<&str> = first.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Bob"]);
        assert_eq!(second.team_name, "Bulls");
        assert!(second.players.is_empty());
    }

    #[test]
    fn roster_position_is_the_index() {
        assert!(matches!(roster_position(3), Ok(3)));
    }
}
