//! Team, player and standings DTOs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common_dto::normalize_login;
use crate::domain::{NewTeam, PlayerId, RosterEntry, Team, TeamId, TeamUpdate};
use crate::error::LeagueError;

/// Request body for `POST /team`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Login name, stored lowercased.
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    /// Contact email, stored lowercased.
    #[validate(email)]
    pub team_email: String,
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub team_name: String,
    /// Initial player names in roster order.
    #[serde(default)]
    pub players: Vec<String>,
}

impl CreateTeamRequest {
    /// Converts into a registration command.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] if a field is out of bounds or a
    /// player name is blank.
    pub fn into_new_team(self) -> Result<NewTeam, LeagueError> {
        self.validate()?;
        Ok(NewTeam {
            id: TeamId::new(),
            username: normalize_login(&self.username),
            email: normalize_login(&self.team_email),
            team_name: self.team_name.trim().to_string(),
            players: player_names(self.players)?,
        })
    }
}

/// Response body for `POST /team` (201 Created).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamResponse {
    /// The stored team.
    #[serde(flatten)]
    pub team: Team,
    /// Whether the password setup mail was sent.
    pub setup_mail_sent: bool,
}

/// Query parameters for `GET /team`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListTeamsParams {
    /// Also list archived teams.
    #[serde(default)]
    pub include_archived: bool,
}

/// Response body for `GET /team/is-unique/{username}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UniqueUsernameResponse {
    /// Normalized username that was checked.
    pub username: String,
    /// `true` if no account uses it.
    pub is_unique: bool,
}

/// One roster line of `PUT /team/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntryDto {
    /// Existing player; omit to add a new one.
    #[serde(default)]
    pub id: Option<PlayerId>,
    /// Display name.
    pub name: String,
}

/// Request body for `PUT /team/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub team_name: String,
    /// Contact email.
    #[validate(email)]
    pub team_email: String,
    /// Full roster in order; active players left out are archived.
    pub players: Vec<RosterEntryDto>,
}

impl UpdateTeamRequest {
    /// Converts into an update command.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] for out-of-bounds fields, blank
    /// player names or a player listed twice.
    pub fn into_update(self) -> Result<TeamUpdate, LeagueError> {
        self.validate()?;
        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(self.players.len());
        for entry in self.players {
            if let Some(id) = entry.id
                && !seen.insert(id)
            {
                return Err(LeagueError::Validation(format!(
                    "player {id} is listed twice"
                )));
            }
            roster.push(RosterEntry {
                id: entry.id,
                name: player_name(&entry.name)?,
            });
        }
        Ok(TeamUpdate {
            team_name: self.team_name.trim().to_string(),
            email: normalize_login(&self.team_email),
            roster,
        })
    }
}

/// Request body for `PUT /team/{id}/player-order`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOrderRequest {
    /// Player ids in their new order.
    pub players: Vec<PlayerId>,
}

impl PlayerOrderRequest {
    /// Returns the order after checking for duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] for an empty list or a player
    /// listed twice.
    pub fn into_order(self) -> Result<Vec<PlayerId>, LeagueError> {
        if self.players.is_empty() {
            return Err(LeagueError::Validation("players must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.players.iter().find(|id| !seen.insert(**id)) {
            return Err(LeagueError::Validation(format!(
                "player {dup} is listed twice"
            )));
        }
        Ok(self.players)
    }
}

/// Request body for `POST /player`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    /// Team to add the player to.
    pub team_id: TeamId,
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

fn player_name(name: &str) -> Result<String, LeagueError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LeagueError::Validation(
            "player name must not be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn player_names(names: Vec<String>) -> Result<Vec<String>, LeagueError> {
    names.iter().map(|n| player_name(n)).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn create_request() -> CreateTeamRequest {
        CreateTeamRequest {
            username: " Arrows ".to_string(),
            team_email: "Captain@Arrows.example".to_string(),
            team_name: " The Arrows ".to_string(),
            players: vec!["Ann".to_string(), " Bob ".to_string()],
        }
    }

    #[test]
    fn create_request_normalizes_fields() {
        let Ok(team) = create_request().into_new_team() else {
            panic!("request is valid");
        };
        assert_eq!(team.username, "arrows");
        assert_eq!(team.email, "captain@arrows.example");
        assert_eq!(team.team_name, "The Arrows");
        assert_eq!(team.players, ["Ann", "Bob"]);
    }

    #[test]
    fn create_request_rejects_bad_email_and_blank_players() {
        let mut bad_email = create_request();
        bad_email.team_email = "not-an-email".to_string();
        assert!(matches!(
            bad_email.into_new_team(),
            Err(LeagueError::Validation(_))
        ));

        let mut blank_player = create_request();
        blank_player.players.push("  ".to_string());
        assert!(matches!(
            blank_player.into_new_team(),
            Err(LeagueError::Validation(_))
        ));
    }

    #[test]
    fn update_rejects_duplicate_players() {
        let id = PlayerId::new();
        let request = UpdateTeamRequest {
            team_name: "Arrows".to_string(),
            team_email: "a@example.com".to_string(),
            players: vec![
                RosterEntryDto {
                    id: Some(id),
                    name: "Ann".to_string(),
                },
                RosterEntryDto {
                    id: Some(id),
                    name: "Ann again".to_string(),
                },
            ],
        };
        assert!(matches!(
            request.into_update(),
            Err(LeagueError::Validation(_))
        ));
    }

    #[test]
    fn update_keeps_new_players_without_id() {
        let request = UpdateTeamRequest {
            team_name: "Arrows".to_string(),
            team_email: "A@Example.com".to_string(),
            players: vec![RosterEntryDto {
                id: None,
                name: " Cid ".to_string(),
            }],
        };
        let Ok(update) = request.into_update() else {
            panic!("request is valid");
        };
        assert_eq!(update.email, "a@example.com");
        assert_eq!(
            update.roster,
            [RosterEntry {
                id: None,
                name: "Cid".to_string()
            }]
        );
    }

    #[test]
    fn player_order_rejects_duplicates() {
        let id = PlayerId::new();
        let request = PlayerOrderRequest {
            players: vec![id, PlayerId::new(), id],
        };
        assert!(request.into_order().is_err());
        assert!(PlayerOrderRequest { players: vec![] }.into_order().is_err());
    }
}
