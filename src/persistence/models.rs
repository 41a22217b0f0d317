//! Database row models and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::standings::{QuarterEntry, ScorePair};
use crate::domain::{
    Account, AccountIdentity, MatchHeader, MatchStatus, Overtime, Player, PlayerId, QuarterDetail,
    Role, Season, SideSheet, StandingsRow,
};
use crate::error::LeagueError;

/// A row of the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Account id.
    pub id: Uuid,
    /// Lowercased login name.
    pub username: String,
    /// Lowercased contact email.
    pub user_email: String,
    /// Team display name; `NULL` for admins.
    pub team_name: Option<String>,
    /// Role text (`TEAM`/`ADMIN`).
    pub role: String,
    /// Argon2 PHC string; `NULL` until the password is set.
    pub password: Option<String>,
    /// Archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Converts into the tagged [`Account`] variant.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Persistence`] for an unknown role.
    pub fn into_account(self) -> Result<Account, LeagueError> {
        let role = parse_role(&self.role)?;
        Ok(Account::from_parts(
            AccountIdentity {
                id: self.id.into(),
                username: self.username,
                email: self.user_email,
            },
            role,
            self.team_name,
        ))
    }
}

/// A row of the `players` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Player id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub user_id: Uuid,
    /// Roster position.
    pub player_order: i32,
    /// Archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            team_id: row.user_id.into(),
            player_order: row.player_order,
            archived_at: row.archived_at,
        }
    }
}

/// A team joined with one of its players (or none).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamPlayerRow {
    /// Team id.
    pub team_id: Uuid,
    /// Team display name.
    pub team_name: String,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub team_email: String,
    /// Team archival timestamp.
    pub team_archived_at: Option<DateTime<Utc>>,
    /// Player id, `NULL` for a team without players.
    pub player_id: Option<Uuid>,
    /// Player name.
    pub player_name: Option<String>,
    /// Player roster position.
    pub player_order: Option<i32>,
}

/// A row of the `seasons` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonRow {
    /// Season id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Creator.
    pub created_by: Uuid,
    /// Active flag.
    pub is_active: bool,
}

impl From<SeasonRow> for Season {
    fn from(row: SeasonRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            created_at: row.created_at,
            created_by: row.created_by.into(),
            is_active: row.is_active,
        }
    }
}

/// A `matches` row joined with both team names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    /// Match id.
    pub id: Uuid,
    /// Season.
    pub season_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Creator.
    pub created_by: Uuid,
    /// Home team.
    pub home_team: Uuid,
    /// Home team name.
    pub home_team_name: String,
    /// Home captain.
    pub home_captain: Uuid,
    /// Guest team.
    pub guest_team: Uuid,
    /// Guest team name.
    pub guest_team_name: String,
    /// Guest captain.
    pub guest_captain: Uuid,
    /// Venue.
    pub match_location: String,
    /// Scheduled date.
    pub match_date: DateTime<Utc>,
    /// Status text.
    pub status: String,
    /// Last status change.
    pub status_changed_at: Option<DateTime<Utc>>,
    /// Account behind the last status change.
    pub status_changed_by: Option<Uuid>,
}

impl TryFrom<MatchRow> for MatchHeader {
    type Error = LeagueError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            season_id: row.season_id.map(Into::into),
            home_team: row.home_team.into(),
            home_team_name: row.home_team_name,
            home_captain: row.home_captain.into(),
            guest_team: row.guest_team.into(),
            guest_team_name: row.guest_team_name,
            guest_captain: row.guest_captain.into(),
            match_location: row.match_location,
            match_date: row.match_date,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            created_by: row.created_by.into(),
            status_changed_at: row.status_changed_at,
            status_changed_by: row.status_changed_by.map(Into::into),
        })
    }
}

/// A row of the `match_details` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuarterRow {
    /// Quarter number.
    pub quarter: i16,
    /// Guest board positions.
    pub guest_positions: Json<Vec<Option<PlayerId>>>,
    /// Home board positions.
    pub home_positions: Json<Vec<Option<PlayerId>>>,
    /// Guest legs per board.
    pub guest_legs: Vec<i32>,
    /// Home legs per board.
    pub home_legs: Vec<i32>,
    /// Guest quarter score.
    pub guest_score: i32,
    /// Home quarter score.
    pub home_score: i32,
}

impl TryFrom<QuarterRow> for QuarterDetail {
    type Error = LeagueError;

    fn try_from(row: QuarterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            quarter: u8::try_from(row.quarter)
                .map_err(|_| LeagueError::Persistence(format!("bad quarter {}", row.quarter)))?,
            guest: side_from_db(row.guest_positions.0, &row.guest_legs, row.guest_score)?,
            home: side_from_db(row.home_positions.0, &row.home_legs, row.home_score)?,
        })
    }
}

/// A row of the `match_overtimes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OvertimeRow {
    /// Guest board positions.
    pub guest_positions: Json<Vec<Option<PlayerId>>>,
    /// Home board positions.
    pub home_positions: Json<Vec<Option<PlayerId>>>,
    /// Guest legs per board.
    pub guest_legs: Vec<i32>,
    /// Home legs per board.
    pub home_legs: Vec<i32>,
    /// Guest overtime score.
    pub guest_score: i32,
    /// Home overtime score.
    pub home_score: i32,
}

impl TryFrom<OvertimeRow> for Overtime {
    type Error = LeagueError;

    fn try_from(row: OvertimeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            guest: side_from_db(row.guest_positions.0, &row.guest_legs, row.guest_score)?,
            home: side_from_db(row.home_positions.0, &row.home_legs, row.home_score)?,
        })
    }
}

/// One row of the standings query: a team, optionally joined with one
/// quarter of one of its matches.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StandingsDbRow {
    /// Team id.
    pub team_id: Uuid,
    /// Team name.
    pub team_name: String,
    /// Match id; `NULL` for a team without matches.
    pub match_id: Option<Uuid>,
    /// Scheduled date.
    pub match_date: Option<DateTime<Utc>>,
    /// Match status text.
    pub status: Option<String>,
    /// Home team.
    pub home_team: Option<Uuid>,
    /// Home team name.
    pub home_team_name: Option<String>,
    /// Guest team.
    pub guest_team: Option<Uuid>,
    /// Guest team name.
    pub guest_team_name: Option<String>,
    /// Venue.
    pub match_location: Option<String>,
    /// Quarter number; `NULL` when the match has no detail rows.
    pub quarter: Option<i16>,
    /// Guest legs per board.
    pub guest_legs: Option<Vec<i32>>,
    /// Home legs per board.
    pub home_legs: Option<Vec<i32>>,
    /// Guest quarter score.
    pub guest_score: Option<i32>,
    /// Home quarter score.
    pub home_score: Option<i32>,
    /// Guest overtime score.
    pub ot_guest_score: Option<i32>,
    /// Home overtime score.
    pub ot_home_score: Option<i32>,
}

impl TryFrom<StandingsDbRow> for StandingsRow {
    type Error = LeagueError;

    fn try_from(row: StandingsDbRow) -> Result<Self, Self::Error> {
        let team_id = row.team_id.into();
        let Some(match_id) = row.match_id else {
            return Ok(Self {
                team_id,
                team_name: row.team_name,
                entry: None,
            });
        };

        let missing = |column: &str| {
            LeagueError::Persistence(format!("match {match_id}: {column} is NULL"))
        };

        // A finished match without any quarter row surfaces as quarter 0
        // and fails the aggregation as incomplete.
        let quarter = row.quarter.map_or(Ok(0), u8::try_from).map_err(|_| {
            LeagueError::Persistence(format!("match {match_id}: bad quarter number"))
        })?;
        let overtime = match (row.ot_guest_score, row.ot_home_score) {
            (Some(guest), Some(home)) => Some(ScorePair {
                guest: count(guest)?,
                home: count(home)?,
            }),
            _ => None,
        };

        let entry = QuarterEntry {
            match_id: match_id.into(),
            match_date: row.match_date.ok_or_else(|| missing("match_date"))?,
            status: parse_status(row.status.as_deref().ok_or_else(|| missing("status"))?)?,
            home_team: row.home_team.ok_or_else(|| missing("home_team"))?.into(),
            home_team_name: row.home_team_name.ok_or_else(|| missing("home_team_name"))?,
            guest_team: row.guest_team.ok_or_else(|| missing("guest_team"))?.into(),
            guest_team_name: row.guest_team_name.ok_or_else(|| missing("guest_team_name"))?,
            match_location: row.match_location.unwrap_or_default(),
            quarter,
            legs: ScorePair {
                guest: legs_total(row.guest_legs.as_deref().unwrap_or_default())?,
                home: legs_total(row.home_legs.as_deref().unwrap_or_default())?,
            },
            score: ScorePair {
                guest: count(row.guest_score.unwrap_or_default())?,
                home: count(row.home_score.unwrap_or_default())?,
            },
            overtime,
        };

        Ok(Self {
            team_id,
            team_name: row.team_name,
            entry: Some(entry),
        })
    }
}

/// Column values of one side of a quarter or overtime sheet.
#[derive(Debug)]
pub struct SheetColumns<'a> {
    /// Board positions as JSONB.
    pub positions: Json<&'a [Option<PlayerId>]>,
    /// Leg counts as `INT4[]`.
    pub legs: Vec<i32>,
    /// Score.
    pub score: i32,
}

impl<'a> SheetColumns<'a> {
    /// Converts a side sheet into its column values.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] for counts beyond `i32::MAX`.
    pub fn new(side: &'a SideSheet) -> Result<Self, LeagueError> {
        Ok(Self {
            positions: Json(side.positions.as_slice()),
            legs: db_legs(&side.legs)?,
            score: db_count(side.score)?,
        })
    }
}

/// Parses a `roles.role` value.
///
/// # Errors
///
/// Returns [`LeagueError::Persistence`] for unknown values.
pub fn parse_role(value: &str) -> Result<Role, LeagueError> {
    value.parse().map_err(LeagueError::Persistence)
}

/// Parses a `matches.status` value.
///
/// # Errors
///
/// Returns [`LeagueError::Persistence`] for unknown values.
pub fn parse_status(value: &str) -> Result<MatchStatus, LeagueError> {
    value.parse().map_err(LeagueError::Persistence)
}

/// Converts a stored count into its unsigned domain value.
///
/// # Errors
///
/// Returns [`LeagueError::Persistence`] for negative values.
pub fn count(value: i32) -> Result<u32, LeagueError> {
    u32::try_from(value).map_err(|_| LeagueError::Persistence(format!("negative count {value}")))
}

/// Converts a domain count into its column value.
///
/// # Errors
///
/// Returns [`LeagueError::Validation`] for values beyond `i32::MAX`.
pub fn db_count(value: u32) -> Result<i32, LeagueError> {
    i32::try_from(value).map_err(|_| LeagueError::Validation(format!("count {value} is too large")))
}

/// Converts domain leg counts into an `INT4[]` value.
///
/// # Errors
///
/// Returns [`LeagueError::Validation`] for values beyond `i32::MAX`.
pub fn db_legs(legs: &[u32]) -> Result<Vec<i32>, LeagueError> {
    legs.iter().map(|&l| db_count(l)).collect()
}

/// Sums stored leg counts of one side.
///
/// # Errors
///
/// Returns [`LeagueError::Persistence`] for a negative count or a sum
/// beyond `u32::MAX`.
pub fn legs_total(legs: &[i32]) -> Result<u32, LeagueError> {
    legs.iter().try_fold(0u32, |acc, &l| {
        acc.checked_add(count(l)?)
            .ok_or_else(|| LeagueError::Persistence(format!("leg total overflows at {l}")))
    })
}

fn side_from_db(
    positions: Vec<Option<PlayerId>>,
    legs: &[i32],
    score: i32,
) -> Result<SideSheet, LeagueError> {
    Ok(SideSheet {
        positions,
        legs: legs.iter().map(|&l| count(l)).collect::<Result<_, _>>()?,
        score: count(score)?,
    })
}
