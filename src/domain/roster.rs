//! Teams, players and seasons as returned to clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{AccountId, PlayerId, SeasonId, TeamId};

/// A rostered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub team_id: TeamId,
    /// Position in the team's roster list.
    pub player_order: i32,
    /// Set once the player leaves the roster.
    pub archived_at: Option<DateTime<Utc>>,
}

/// A team with its active players in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Team (account) id.
    pub id: TeamId,
    /// Display name.
    pub team_name: String,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub team_email: String,
    /// Set once the team is archived.
    pub archived_at: Option<DateTime<Utc>>,
    /// Active players ordered by `player_order`, then name.
    pub players: Vec<Player>,
}

impl Team {
    /// Returns `true` unless the team has been archived.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}

/// A league season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    /// Season id.
    pub id: SeasonId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Creator.
    pub created_by: AccountId,
    /// Whether this is the active season.
    pub is_active: bool,
}

/// A validated request to register a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    /// Id assigned to the new account.
    pub id: TeamId,
    /// Lowercased login name.
    pub username: String,
    /// Lowercased contact email.
    pub email: String,
    /// Display name.
    pub team_name: String,
    /// Initial player names in roster order.
    pub players: Vec<String>,
}

/// One roster line of a team update. Lines without an id are new players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Existing player, if any.
    pub id: Option<PlayerId>,
    /// Display name.
    pub name: String,
}

/// A validated full replacement of a team's editable fields. Active
/// players missing from `roster` are archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamUpdate {
    /// Display name.
    pub team_name: String,
    /// Lowercased contact email.
    pub email: String,
    /// Players in roster order.
    pub roster: Vec<RosterEntry>,
}
