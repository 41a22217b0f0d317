//! Team service: registration, rosters and the standings table.

use crate::domain::{
    NewTeam, Player, PlayerId, Principal, Team, TeamId, TeamStanding, TeamUpdate, standings,
};
use crate::error::LeagueError;
use crate::persistence::{PostgresPersistence, TokenPurpose};

use super::auth_service::{AuthService, authorize_admin};

/// Result of registering a team.
#[derive(Debug, Clone)]
pub struct CreatedTeam {
    /// The stored team with its players.
    pub team: Team,
    /// Whether the password setup mail was handed off.
    pub setup_mail_sent: bool,
}

/// Orchestrates team and roster operations.
#[derive(Debug, Clone)]
pub struct TeamService {
    store: PostgresPersistence,
    auth: AuthService,
}

impl TeamService {
    /// Creates a new `TeamService`.
    #[must_use]
    pub fn new(store: PostgresPersistence, auth: AuthService) -> Self {
        Self { store, auth }
    }

    /// Registers a team with its initial players and mails the password
    /// setup link.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin,
    /// or [`LeagueError::Conflict`] if the username is taken.
    pub async fn create_team(
        &self,
        principal: &Principal,
        team: NewTeam,
    ) -> Result<CreatedTeam, LeagueError> {
        authorize_admin(principal)?;

        let issued = self.auth.issue_password_token(TokenPurpose::Setup);
        self.store.create_team(&team, &issued.record).await?;
        tracing::info!(team_id = %team.id, username = %team.username, "team created");

        let setup_mail_sent = self
            .auth
            .send_setup_mail(&team.email, &team.team_name, &issued.token);
        let stored = self.get_team(team.id).await?;
        Ok(CreatedTeam {
            team: stored,
            setup_mail_sent,
        })
    }

    /// Lists teams by name with their active players.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn list_teams(&self, include_archived: bool) -> Result<Vec<Team>, LeagueError> {
        self.store.list_teams(include_archived).await
    }

    /// Loads one team.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] for an unknown id.
    pub async fn get_team(&self, id: TeamId) -> Result<Team, LeagueError> {
        self.store
            .get_team(id)
            .await?
            .ok_or_else(|| LeagueError::not_found("team", id))
    }

    /// Returns `true` if no account uses `username` yet.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Persistence`] on database failure.
    pub async fn username_is_unique(&self, username: &str) -> Result<bool, LeagueError> {
        let taken = self
            .store
            .username_exists(&username.trim().to_lowercase())
            .await?;
        Ok(!taken)
    }

    /// Replaces a team's name, email and roster.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin,
    /// or [`LeagueError::NotFound`] for an unknown team or player.
    pub async fn update_team(
        &self,
        principal: &Principal,
        id: TeamId,
        update: TeamUpdate,
    ) -> Result<Team, LeagueError> {
        authorize_admin(principal)?;
        self.store.update_team(id, &update).await?;
        tracing::info!(team_id = %id, players = update.roster.len(), "team updated");
        self.get_team(id).await
    }

    /// Archives a team. Its matches stay; it leaves listings and standings.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin,
    /// or [`LeagueError::NotFound`] if no active team has this id.
    pub async fn archive_team(&self, principal: &Principal, id: TeamId) -> Result<(), LeagueError> {
        authorize_admin(principal)?;
        self.store.archive_team(id).await?;
        tracing::info!(team_id = %id, "team archived");
        Ok(())
    }

    /// Adds a player at the end of a team's roster.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin or
    /// the team itself, or [`LeagueError::NotFound`] for an unknown team.
    pub async fn add_player(
        &self,
        principal: &Principal,
        team_id: TeamId,
        name: &str,
    ) -> Result<Player, LeagueError> {
        authorize_team(principal, team_id)?;
        let player = self.store.add_player(team_id, name).await?;
        tracing::info!(%team_id, player_id = %player.id, "player added");
        Ok(player)
    }

    /// Reorders a team's players.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin or
    /// the team itself, or [`LeagueError::NotFound`] if a player is not an
    /// active member of the team.
    pub async fn set_player_order(
        &self,
        principal: &Principal,
        team_id: TeamId,
        order: &[PlayerId],
    ) -> Result<Team, LeagueError> {
        authorize_team(principal, team_id)?;
        self.store.set_player_order(team_id, order).await?;
        tracing::info!(%team_id, players = order.len(), "player order updated");
        self.get_team(team_id).await
    }

    /// Computes the ranked standings table.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Standings`] if the stored match data is
    /// incomplete, or [`LeagueError::Persistence`] on database failure.
    pub async fn standings(&self) -> Result<Vec<TeamStanding>, LeagueError> {
        let rows = self.store.standings_rows().await?;
        let table = standings::aggregate(rows)?;
        tracing::debug!(teams = table.len(), "standings computed");
        Ok(table)
    }
}

/// Fails unless the principal is an admin or the team itself.
fn authorize_team(principal: &Principal, team_id: TeamId) -> Result<(), LeagueError> {
    if principal.is_admin_or(team_id) {
        Ok(())
    } else {
        Err(LeagueError::Forbidden(format!(
            "only team {team_id} or an admin may change its roster"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, Role};

    #[test]
    fn teams_manage_only_their_own_roster() {
        let team_id = AccountId::new();
        let own = Principal {
            account_id: team_id,
            role: Role::Team,
        };
        let other = Principal {
            account_id: AccountId::new(),
            role: Role::Team,
        };
        let admin = Principal {
            account_id: AccountId::new(),
            role: Role::Admin,
        };

        assert!(authorize_team(&own, team_id).is_ok());
        assert!(authorize_team(&admin, team_id).is_ok());
        assert!(matches!(
            authorize_team(&other, team_id),
            Err(LeagueError::Forbidden(_))
        ));
    }
}
