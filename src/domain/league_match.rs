//! Match commands and read models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::quarter::{LEGS_PER_QUARTER, Overtime, QUARTER_COUNT, QuarterDetail, SideSheet};
use super::{AccountId, MatchId, MatchStatus, PlayerId, SeasonId, TeamId};

/// A team's line-up at match creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLineup {
    /// Team taking part.
    pub team: TeamId,
    /// Captain of the team for this match.
    pub captain: PlayerId,
    /// Eight board positions, the first three always filled.
    pub positions: Vec<Option<PlayerId>>,
}

/// A validated request to schedule a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    /// Client-supplied creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Account recorded as creator.
    pub created_by: AccountId,
    /// Home line-up.
    pub home: TeamLineup,
    /// Guest line-up.
    pub guest: TeamLineup,
    /// Venue.
    pub location: String,
    /// Scheduled date.
    pub match_date: DateTime<Utc>,
}

impl NewMatch {
    /// The four quarter sheets written alongside the header, all seeded
    /// with the creation line-ups and empty scores.
    #[must_use]
    pub fn seeded_quarters(&self) -> Vec<QuarterDetail> {
        (1..=QUARTER_COUNT)
            .map(|quarter| QuarterDetail {
                quarter,
                guest: SideSheet::seeded(self.guest.positions.clone(), LEGS_PER_QUARTER),
                home: SideSheet::seeded(self.home.positions.clone(), LEGS_PER_QUARTER),
            })
            .collect()
    }
}

/// A validated full replacement of a match's scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchUpdate {
    /// Status after the update.
    pub status: MatchStatus,
    /// Account performing the update.
    pub changed_by: AccountId,
    /// Exactly four sheets ordered by quarter.
    pub quarters: Vec<QuarterDetail>,
}

/// Match header row as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchHeader {
    /// Match id.
    pub id: MatchId,
    /// Season the match belongs to.
    pub season_id: Option<SeasonId>,
    /// Home team.
    pub home_team: TeamId,
    /// Home team display name.
    pub home_team_name: String,
    /// Home captain.
    pub home_captain: PlayerId,
    /// Guest team.
    pub guest_team: TeamId,
    /// Guest team display name.
    pub guest_team_name: String,
    /// Guest captain.
    pub guest_captain: PlayerId,
    /// Venue.
    pub match_location: String,
    /// Scheduled date.
    pub match_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Creator.
    pub created_by: AccountId,
    /// Last status change.
    pub status_changed_at: Option<DateTime<Utc>>,
    /// Account behind the last status change.
    pub status_changed_by: Option<AccountId>,
}

/// Full match view: header, quarters and overtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    /// Header fields.
    #[serde(flatten)]
    pub header: MatchHeader,
    /// Quarter sheets ordered by quarter.
    pub quarters: Vec<QuarterDetail>,
    /// Overtime sheet, if one was played.
    pub overtime: Option<Overtime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineup() -> TeamLineup {
        let mut positions: Vec<Option<PlayerId>> = (0..3).map(|_| Some(PlayerId::new())).collect();
        positions.resize(8, None);
        TeamLineup {
            team: TeamId::new(),
            captain: PlayerId::new(),
            positions,
        }
    }

    #[test]
    fn seeded_quarters_share_the_creation_lineup() {
        let new_match = NewMatch {
            created_at: Utc::now(),
            created_by: AccountId::new(),
            home: lineup(),
            guest: lineup(),
            location: "Pub".to_string(),
            match_date: Utc::now(),
        };
        let quarters = new_match.seeded_quarters();
        assert_eq!(quarters.len(), 4);
        for (expected, q) in (1..=4).zip(&quarters) {
            assert_eq!(q.quarter, expected);
            assert_eq!(q.home.positions, new_match.home.positions);
            assert_eq!(q.guest.positions, new_match.guest.positions);
            assert_eq!(q.home.legs, vec![0; 4]);
            assert_eq!(q.guest.score, 0);
        }
    }
}
