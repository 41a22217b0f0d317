//! Per-quarter and overtime score sheets.
//!
//! A match is played over four quarters. In each quarter both sides field
//! up to eight players on fixed board positions, play up to four legs per
//! board pairing and finish with a quarter score. Overtime has the same
//! shape with four to six positions and exactly three legs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PlayerId;
use crate::error::LeagueError;

/// Number of quarters in regulation.
pub const QUARTER_COUNT: u8 = 4;
/// Board positions per side in a quarter.
pub const POSITIONS_PER_SIDE: usize = 8;
/// Positions that must be filled when a match is created.
pub const REQUIRED_POSITIONS: usize = 3;
/// Maximum leg counts per side in a quarter.
pub const LEGS_PER_QUARTER: usize = 4;
/// Board positions per side in overtime.
pub const OVERTIME_POSITIONS: usize = 6;
/// Overtime positions that must be filled.
pub const OVERTIME_REQUIRED_POSITIONS: usize = 4;
/// Leg counts per side in overtime.
pub const OVERTIME_LEGS: usize = 3;
/// Largest leg count accepted on one board pairing.
pub const MAX_LEG_COUNT: u32 = 99;
/// Largest score accepted for one side of a segment.
pub const MAX_SCORE: u32 = 99;

/// One side's sheet for a quarter or for overtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SideSheet {
    /// Player per board position; `None` for an empty board.
    pub positions: Vec<Option<PlayerId>>,
    /// Legs won on each board pairing.
    pub legs: Vec<u32>,
    /// Score of this side for the segment.
    pub score: u32,
}

impl SideSheet {
    /// A sheet with the given positions and no legs or score yet.
    #[must_use]
    pub fn seeded(positions: Vec<Option<PlayerId>>, leg_slots: usize) -> Self {
        Self {
            positions,
            legs: vec![0; leg_slots],
            score: 0,
        }
    }

    /// Pads `positions` to `slots` entries and checks the bounds of a
    /// regulation quarter sheet.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] if there are more than eight
    /// positions, more than four leg counts, or a count or score above
    /// its maximum.
    pub fn normalized_quarter(self, side: &str) -> Result<Self, LeagueError> {
        self.normalized(side, POSITIONS_PER_SIDE, 0, LEGS_PER_QUARTER, false)
    }

    /// Pads and checks an overtime sheet: four to six positions with the
    /// first four filled and exactly three leg counts.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] on any bound violation.
    pub fn normalized_overtime(self, side: &str) -> Result<Self, LeagueError> {
        self.normalized(
            side,
            OVERTIME_POSITIONS,
            OVERTIME_REQUIRED_POSITIONS,
            OVERTIME_LEGS,
            true,
        )
    }

    fn normalized(
        mut self,
        side: &str,
        slots: usize,
        required: usize,
        legs: usize,
        exact_legs: bool,
    ) -> Result<Self, LeagueError> {
        if self.positions.len() > slots {
            return Err(LeagueError::Validation(format!(
                "{side}: at most {slots} positions allowed, got {}",
                self.positions.len()
            )));
        }
        self.positions.resize(slots, None);

        if let Some(missing) = self.positions.iter().take(required).position(Option::is_none) {
            return Err(LeagueError::Validation(format!(
                "{side}: position {} is required",
                missing + 1
            )));
        }

        if self.legs.len() > legs || (exact_legs && self.legs.len() != legs) {
            return Err(LeagueError::Validation(format!(
                "{side}: expected {}{legs} leg counts, got {}",
                if exact_legs { "" } else { "at most " },
                self.legs.len()
            )));
        }
        if let Some(leg) = self.legs.iter().find(|&&l| l > MAX_LEG_COUNT) {
            return Err(LeagueError::Validation(format!(
                "{side}: leg count {leg} exceeds {MAX_LEG_COUNT}"
            )));
        }
        if self.score > MAX_SCORE {
            return Err(LeagueError::Validation(format!(
                "{side}: score {} exceeds {MAX_SCORE}",
                self.score
            )));
        }
        self.legs.resize(legs, 0);
        Ok(self)
    }
}

/// Score sheet of one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuarterDetail {
    /// Quarter number, 1..=4.
    pub quarter: u8,
    /// Guest side.
    pub guest: SideSheet,
    /// Home side.
    pub home: SideSheet,
}

impl QuarterDetail {
    /// Checks a full replacement set: exactly one sheet per quarter 1..=4.
    /// Returns the sheets ordered by quarter with normalized sides.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] if a quarter is missing,
    /// duplicated or out of range, or a side is out of bounds.
    pub fn validate_full_set(mut quarters: Vec<Self>) -> Result<Vec<Self>, LeagueError> {
        if quarters.len() != usize::from(QUARTER_COUNT) {
            return Err(LeagueError::Validation(format!(
                "expected {QUARTER_COUNT} quarters, got {}",
                quarters.len()
            )));
        }
        quarters.sort_by_key(|q| q.quarter);

        let mut normalized = Vec::with_capacity(quarters.len());
        for (expected, detail) in (1..=QUARTER_COUNT).zip(quarters) {
            if detail.quarter != expected {
                return Err(LeagueError::Validation(format!(
                    "quarters must be numbered 1..={QUARTER_COUNT} exactly once; quarter {expected} is missing"
                )));
            }
            let guest = detail
                .guest
                .normalized_quarter(&format!("quarter {expected} guest"))?;
            let home = detail
                .home
                .normalized_quarter(&format!("quarter {expected} home"))?;
            normalized.push(Self {
                quarter: expected,
                guest,
                home,
            });
        }
        Ok(normalized)
    }
}

/// Overtime score sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overtime {
    /// Guest side.
    pub guest: SideSheet,
    /// Home side.
    pub home: SideSheet,
}

impl Overtime {
    /// Normalizes both sides to the overtime bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] on any bound violation.
    pub fn validated(self) -> Result<Self, LeagueError> {
        Ok(Self {
            guest: self.guest.normalized_overtime("overtime guest")?,
            home: self.home.normalized_overtime("overtime home")?,
        })
    }
}
