//! Match DTOs.
//!
//! The create payload keeps one flat field per board position
//! (`homePos1`..`homePos8`, `guestPos1`..`guestPos8`). Every required
//! field is optional at the serde level so that a missing one is reported
//! by name as a validation error instead of a generic body rejection.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::quarter::{POSITIONS_PER_SIDE, REQUIRED_POSITIONS};
use crate::domain::{
    AccountId, MatchStatus, NewMatch, Overtime, PlayerId, QuarterDetail, TeamId, TeamLineup,
};
use crate::error::LeagueError;

/// Request body for `POST /match`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CreateMatchRequest {
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<AccountId>,
    pub home_team: Option<TeamId>,
    pub home_captain: Option<PlayerId>,
    pub home_pos1: Option<PlayerId>,
    pub home_pos2: Option<PlayerId>,
    pub home_pos3: Option<PlayerId>,
    pub home_pos4: Option<PlayerId>,
    pub home_pos5: Option<PlayerId>,
    pub home_pos6: Option<PlayerId>,
    pub home_pos7: Option<PlayerId>,
    pub home_pos8: Option<PlayerId>,
    pub guest_team: Option<TeamId>,
    pub guest_captain: Option<PlayerId>,
    pub guest_pos1: Option<PlayerId>,
    pub guest_pos2: Option<PlayerId>,
    pub guest_pos3: Option<PlayerId>,
    pub guest_pos4: Option<PlayerId>,
    pub guest_pos5: Option<PlayerId>,
    pub guest_pos6: Option<PlayerId>,
    pub guest_pos7: Option<PlayerId>,
    pub guest_pos8: Option<PlayerId>,
    pub match_location: Option<String>,
    pub match_date: Option<DateTime<Utc>>,
}

impl CreateMatchRequest {
    /// Checks presence of every required field and builds the command.
    /// The stored creator is `caller`, whatever `createdBy` says.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] naming the first missing field,
    /// or when home and guest are the same team.
    pub fn into_new_match(self, caller: AccountId) -> Result<NewMatch, LeagueError> {
        let created_at = required(self.created_at, "createdAt")?;
        required(self.created_by, "createdBy")?;
        let home_team = required(self.home_team, "homeTeam")?;
        let guest_team = required(self.guest_team, "guestTeam")?;
        let home_captain = required(self.home_captain, "homeCaptain")?;
        let guest_captain = required(self.guest_captain, "guestCaptain")?;

        let home_positions = positions(
            "homePos",
            [
                self.home_pos1,
                self.home_pos2,
                self.home_pos3,
                self.home_pos4,
                self.home_pos5,
                self.home_pos6,
                self.home_pos7,
                self.home_pos8,
            ],
        )?;
        let guest_positions = positions(
            "guestPos",
            [
                self.guest_pos1,
                self.guest_pos2,
                self.guest_pos3,
                self.guest_pos4,
                self.guest_pos5,
                self.guest_pos6,
                self.guest_pos7,
                self.guest_pos8,
            ],
        )?;

        let location = required(self.match_location, "matchLocation")?
            .trim()
            .to_string();
        if location.is_empty() {
            return Err(LeagueError::Validation(
                "matchLocation is required".to_string(),
            ));
        }
        let match_date = required(self.match_date, "matchDate")?;

        if home_team == guest_team {
            return Err(LeagueError::Validation(
                "homeTeam and guestTeam must differ".to_string(),
            ));
        }

        Ok(NewMatch {
            created_at,
            created_by: caller,
            home: TeamLineup {
                team: home_team,
                captain: home_captain,
                positions: home_positions,
            },
            guest: TeamLineup {
                team: guest_team,
                captain: guest_captain,
                positions: guest_positions,
            },
            location,
            match_date,
        })
    }
}

/// Request body for `PUT /match/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    /// Status after the update (`IN_PROGRESS` or `FINISHED`).
    pub status: MatchStatus,
    /// All four quarter sheets.
    pub quarters: Vec<QuarterDetail>,
}

impl UpdateMatchRequest {
    /// Checks the quarter set and returns its normalized form.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] unless exactly quarters 1..=4
    /// are present, each within bounds, and the target status is one an
    /// update may set.
    pub fn into_parts(self) -> Result<(MatchStatus, Vec<QuarterDetail>), LeagueError> {
        if !matches!(self.status, MatchStatus::InProgress | MatchStatus::Finished) {
            return Err(LeagueError::Validation(format!(
                "status must be IN_PROGRESS or FINISHED, got {}",
                self.status
            )));
        }
        let quarters = QuarterDetail::validate_full_set(self.quarters)?;
        Ok((self.status, quarters))
    }
}

/// Request body for `POST`/`PUT /match/{id}/overtime`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRequest {
    /// Overtime sheet of both sides.
    #[serde(flatten)]
    pub overtime: Overtime,
}

impl OvertimeRequest {
    /// Checks and normalizes the overtime sheet.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] on any bound violation.
    pub fn into_overtime(self) -> Result<Overtime, LeagueError> {
        self.overtime.validated()
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, LeagueError> {
    value.ok_or_else(|| LeagueError::Validation(format!("{field} is required")))
}

fn positions(
    prefix: &str,
    slots: [Option<PlayerId>; POSITIONS_PER_SIDE],
) -> Result<Vec<Option<PlayerId>>, LeagueError> {
    if let Some(missing) = slots
        .iter()
        .take(REQUIRED_POSITIONS)
        .position(Option::is_none)
    {
        return Err(LeagueError::Validation(format!(
            "{prefix}{} is required",
            missing + 1
        )));
    }
    Ok(slots.to_vec())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SideSheet;

    fn full_request() -> CreateMatchRequest {
        CreateMatchRequest {
            created_at: Some(Utc::now()),
            created_by: Some(AccountId::new()),
            home_team: Some(TeamId::new()),
            home_captain: Some(PlayerId::new()),
            home_pos1: Some(PlayerId::new()),
            home_pos2: Some(PlayerId::new()),
            home_pos3: Some(PlayerId::new()),
            guest_team: Some(TeamId::new()),
            guest_captain: Some(PlayerId::new()),
            guest_pos1: Some(PlayerId::new()),
            guest_pos2: Some(PlayerId::new()),
            guest_pos3: Some(PlayerId::new()),
            match_location: Some("Bar".to_string()),
            match_date: Some(Utc::now()),
            ..CreateMatchRequest::default()
        }
    }

    #[test]
    fn complete_request_builds_padded_lineups() {
        let caller = AccountId::new();
        let Ok(new) = full_request().into_new_match(caller) else {
            panic!("request is complete");
        };
        assert_eq!(new.created_by, caller);
        assert_eq!(new.home.positions.len(), POSITIONS_PER_SIDE);
        assert_eq!(new.guest.positions.iter().flatten().count(), 3);
    }

    #[test]
    fn missing_home_captain_is_rejected() {
        let request = CreateMatchRequest {
            home_captain: None,
            ..full_request()
        };
        let Err(LeagueError::Validation(message)) = request.into_new_match(AccountId::new())
        else {
            panic!("validation error expected");
        };
        assert_eq!(message, "homeCaptain is required");
    }

    #[test]
    fn missing_required_position_is_named() {
        let request = CreateMatchRequest {
            guest_pos2: None,
            ..full_request()
        };
        let Err(LeagueError::Validation(message)) = request.into_new_match(AccountId::new())
        else {
            panic!("validation error expected");
        };
        assert_eq!(message, "guestPos2 is required");
    }

    #[test]
    fn same_team_cannot_play_itself() {
        let mut request = full_request();
        request.guest_team = request.home_team;
        assert!(matches!(
            request.into_new_match(AccountId::new()),
            Err(LeagueError::Validation(_))
        ));
    }

    #[test]
    fn create_request_parses_camel_case_json() {
        let body = serde_json::json!({
            "createdAt": "2026-03-01T18:00:00Z",
            "homeTeam": uuid::Uuid::new_v4(),
            "homePos1": uuid::Uuid::new_v4(),
            "matchLocation": "Bar"
        });
        let Ok(request) = serde_json::from_value::<CreateMatchRequest>(body) else {
            panic!("body must parse");
        };
        assert!(request.home_team.is_some());
        assert!(request.home_pos1.is_some());
        assert!(request.home_captain.is_none());
    }

    fn quarter(n: u8) -> QuarterDetail {
        let side = SideSheet {
            positions: vec![Some(PlayerId::new()); 3],
            legs: vec![1, 2],
            score: 1,
        };
        QuarterDetail {
            quarter: n,
            guest: side.clone(),
            home: side,
        }
    }

    #[test]
    fn update_requires_all_four_quarters() {
        let request = UpdateMatchRequest {
            status: MatchStatus::InProgress,
            quarters: vec![quarter(1), quarter(2), quarter(3)],
        };
        assert!(matches!(
            request.into_parts(),
            Err(LeagueError::Validation(_))
        ));
    }

    #[test]
    fn update_cannot_set_new_or_reopened() {
        for status in [MatchStatus::New, MatchStatus::Reopened] {
            let request = UpdateMatchRequest {
                status,
                quarters: (1..=4).map(quarter).collect(),
            };
            assert!(request.into_parts().is_err());
        }
    }

    #[test]
    fn update_orders_quarters() {
        let request = UpdateMatchRequest {
            status: MatchStatus::Finished,
            quarters: vec![quarter(4), quarter(2), quarter(1), quarter(3)],
        };
        let Ok((status, quarters)) = request.into_parts() else {
            panic!("request is valid");
        };
        assert_eq!(status, MatchStatus::Finished);
        let numbers: Vec<u8> = quarters.iter().map(|q| q.quarter).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
    }

    #[test]
    fn update_rejects_leg_counts_beyond_the_maximum() {
        let mut quarters: Vec<QuarterDetail> = (1..=4).map(quarter).collect();
        if let Some(first) = quarters.first_mut() {
            first.home.legs = vec![i32::MAX.unsigned_abs(); 4];
        }
        let request = UpdateMatchRequest {
            status: MatchStatus::Finished,
            quarters,
        };
        let Err(err) = request.into_parts() else {
            panic!("oversized legs accepted");
        };
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
