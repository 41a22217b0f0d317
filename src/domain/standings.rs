//! League standings: folds per-quarter match rows into a ranked table.
//!
//! The store hands over one row per (team, match, quarter) for every
//! active team, plus a bare row for teams that have not played yet. The
//! fold is a single pass:
//!
//! 1. rows are grouped by team id in first-seen order;
//! 2. for every team, quarter 1 opens a match summary, quarters 2..=4 add
//!    their legs, and quarter 4 closes it with the final game score and
//!    any overtime score;
//! 3. each closed summary is scored (regulation result first, overtime only
//!    when regulation is level) and the team totals are ranked.
//!
//! Input that is structurally incomplete (a finished match with a missing
//! or out-of-sequence quarter) fails the whole aggregation rather than
//! producing wrong totals.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::quarter::QUARTER_COUNT;
use super::{MatchId, MatchStatus, TeamId};

/// League points for a regulation win.
pub const POINTS_FOR_WIN: u32 = 2;
/// League points for an overtime win.
pub const POINTS_FOR_OVERTIME_WIN: u32 = 1;

/// Guest/home pair of a score or leg count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScorePair {
    /// Guest value.
    pub guest: u32,
    /// Home value.
    pub home: u32,
}

impl ScorePair {
    /// Returns `(own, opponent)` as seen from `side`.
    #[must_use]
    pub const fn for_side(self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home, self.guest),
            Side::Guest => (self.guest, self.home),
        }
    }
}

/// A score from one team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnScore {
    /// This team's value.
    pub own: u32,
    /// The opponent's value.
    pub opponent: u32,
}

/// One quarter of one match, as seen from the team the row is grouped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterEntry {
    /// Match id.
    pub match_id: MatchId,
    /// Scheduled date.
    pub match_date: DateTime<Utc>,
    /// Lifecycle status; only `FINISHED` matches count.
    pub status: MatchStatus,
    /// Home team id.
    pub home_team: TeamId,
    /// Home team name.
    pub home_team_name: String,
    /// Guest team id.
    pub guest_team: TeamId,
    /// Guest team name.
    pub guest_team_name: String,
    /// Venue.
    pub match_location: String,
    /// Quarter number.
    pub quarter: u8,
    /// Legs won in this quarter.
    pub legs: ScorePair,
    /// Game score recorded on this quarter's sheet.
    pub score: ScorePair,
    /// Overtime score, when the match went to overtime.
    pub overtime: Option<ScorePair>,
}

/// Input row of the aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsRow {
    /// Team the row is grouped under.
    pub team_id: TeamId,
    /// Team display name.
    pub team_name: String,
    /// `None` for a team without any match.
    pub entry: Option<QuarterEntry>,
}

/// Which side of a match a team played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Home side.
    Home,
    /// Guest side.
    Guest,
}

/// Result of a single match for one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOutcome {
    /// Won on game score.
    Win,
    /// Lost on game score.
    Loss,
    /// Level on game score, won in overtime.
    OvertimeWin,
    /// Level on game score, lost in overtime.
    OvertimeLoss,
    /// Level on game score and level (or no) overtime. Counts for neither
    /// side.
    Undecided,
}

impl MatchOutcome {
    /// Decides the outcome from the team's point of view.
    #[must_use]
    pub fn decide(games: (u32, u32), overtime: Option<(u32, u32)>) -> Self {
        match games.0.cmp(&games.1) {
            Ordering::Greater => Self::Win,
            Ordering::Less => Self::Loss,
            Ordering::Equal => match overtime.map(|(own, opp)| own.cmp(&opp)) {
                Some(Ordering::Greater) => Self::OvertimeWin,
                Some(Ordering::Less) => Self::OvertimeLoss,
                Some(Ordering::Equal) | None => Self::Undecided,
            },
        }
    }

    /// League points awarded for this outcome.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::Win => POINTS_FOR_WIN,
            Self::OvertimeWin => POINTS_FOR_OVERTIME_WIN,
            Self::Loss | Self::OvertimeLoss | Self::Undecided => 0,
        }
    }
}

/// Per-match drill-down line of a team's standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// Match id.
    pub match_id: MatchId,
    /// Scheduled date.
    pub match_date: DateTime<Utc>,
    /// Venue.
    pub match_location: String,
    /// Side this team played.
    pub side: Side,
    /// Opponent id.
    pub opponent_id: TeamId,
    /// Opponent name.
    pub opponent_name: String,
    /// Legs won over all four quarters.
    pub legs_won: u32,
    /// Legs lost over all four quarters.
    pub legs_lost: u32,
    /// Final game score for this team.
    pub games_won: u32,
    /// Final game score for the opponent.
    pub games_lost: u32,
    /// Overtime score, when played.
    pub overtime: Option<OwnScore>,
    /// Match result.
    pub outcome: MatchOutcome,
    /// League points earned.
    pub points: u32,
}

/// One line of the standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    /// 1-based position in the table.
    pub rank: u32,
    /// Team id.
    pub team_id: TeamId,
    /// Team name.
    pub team_name: String,
    /// Finished matches played.
    pub matches_played: u32,
    /// Regulation wins.
    pub wins: u32,
    /// Regulation losses.
    pub losses: u32,
    /// Overtime wins.
    pub overtime_wins: u32,
    /// Overtime losses.
    pub overtime_losses: u32,
    /// Legs won.
    pub legs_won: u32,
    /// Legs lost.
    pub legs_lost: u32,
    /// Games (points on the score sheet) won.
    pub games_won: u32,
    /// Games lost.
    pub games_lost: u32,
    /// League points.
    pub points: u32,
    /// Finished matches, most recent first.
    pub matches: Vec<MatchSummary>,
}

impl TeamStanding {
    fn from_summaries(
        team_id: TeamId,
        team_name: String,
        matches: Vec<MatchSummary>,
    ) -> Result<Self, StandingsError> {
        let mut standing = Self {
            rank: 0,
            team_id,
            team_name,
            matches_played: 0,
            wins: 0,
            losses: 0,
            overtime_wins: 0,
            overtime_losses: 0,
            legs_won: 0,
            legs_lost: 0,
            games_won: 0,
            games_lost: 0,
            points: 0,
            matches: Vec::new(),
        };
        let overflow = || StandingsError::CountOverflow { team_id };
        for summary in &matches {
            let counter = match summary.outcome {
                MatchOutcome::Win => Some(&mut standing.wins),
                MatchOutcome::Loss => Some(&mut standing.losses),
                MatchOutcome::OvertimeWin => Some(&mut standing.overtime_wins),
                MatchOutcome::OvertimeLoss => Some(&mut standing.overtime_losses),
                MatchOutcome::Undecided => None,
            };
            if let Some(counter) = counter {
                *counter = counter.checked_add(1).ok_or_else(overflow)?;
            }
            standing.matches_played = standing
                .matches_played
                .checked_add(1)
                .ok_or_else(overflow)?;
            standing.legs_won = standing
                .legs_won
                .checked_add(summary.legs_won)
                .ok_or_else(overflow)?;
            standing.legs_lost = standing
                .legs_lost
                .checked_add(summary.legs_lost)
                .ok_or_else(overflow)?;
            standing.games_won = standing
                .games_won
                .checked_add(summary.games_won)
                .ok_or_else(overflow)?;
            standing.games_lost = standing
                .games_lost
                .checked_add(summary.games_lost)
                .ok_or_else(overflow)?;
            standing.points = standing
                .points
                .checked_add(summary.points)
                .ok_or_else(overflow)?;
        }
        standing.matches = matches;
        Ok(standing)
    }

    /// Table order: points, regulation wins and legs won descending, then
    /// team name and finally team id ascending.
    #[must_use]
    pub fn table_order(&self, other: &Self) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then_with(|| other.wins.cmp(&self.wins))
            .then_with(|| other.legs_won.cmp(&self.legs_won))
            .then_with(|| self.team_name.cmp(&other.team_name))
            .then_with(|| self.team_id.cmp(&other.team_id))
    }
}

/// Structural problems in the aggregation input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StandingsError {
    /// A finished match is missing a quarter or its quarters are out of order.
    #[error("match {match_id} of team {team_id}: expected quarter {expected}, found {}", .found.map_or_else(|| "end of rows".to_string(), |q| format!("quarter {q}")))]
    MissingQuarter {
        /// Team the rows were grouped under.
        team_id: TeamId,
        /// Match with the gap.
        match_id: MatchId,
        /// Quarter that should have come next.
        expected: u8,
        /// Quarter actually found, `None` at end of input.
        found: Option<u8>,
    },

    /// Quarter number outside 1..=4.
    #[error("match {match_id}: quarter {quarter} is out of range")]
    UnexpectedQuarter {
        /// Offending match.
        match_id: MatchId,
        /// Offending quarter number.
        quarter: u8,
    },

    /// A row grouped under a team that plays neither side of the match.
    #[error("team {team_id} does not play in match {match_id}")]
    TeamNotInMatch {
        /// Team the row was grouped under.
        team_id: TeamId,
        /// Match referenced by the row.
        match_id: MatchId,
    },

    /// A running total left the `u32` range.
    #[error("team {team_id}: a standings total overflowed")]
    CountOverflow {
        /// Team whose totals overflowed.
        team_id: TeamId,
    },

    /// The same match was opened twice for one team.
    #[error("match {match_id} appears twice for team {team_id}")]
    DuplicateMatch {
        /// Team the rows were grouped under.
        team_id: TeamId,
        /// Repeated match.
        match_id: MatchId,
    },
}

/// Match being accumulated quarter by quarter.
#[derive(Debug)]
struct OpenMatch {
    match_id: MatchId,
    match_date: DateTime<Utc>,
    match_location: String,
    side: Side,
    opponent_id: TeamId,
    opponent_name: String,
    next_quarter: u8,
    legs: ScorePair,
}

impl OpenMatch {
    fn close(self, score: ScorePair, overtime: Option<ScorePair>) -> MatchSummary {
        let (legs_won, legs_lost) = self.legs.for_side(self.side);
        let games = score.for_side(self.side);
        let overtime = overtime.map(|ot| ot.for_side(self.side));
        let outcome = MatchOutcome::decide(games, overtime);
        let overtime = overtime.map(|(own, opponent)| OwnScore { own, opponent });
        MatchSummary {
            match_id: self.match_id,
            match_date: self.match_date,
            match_location: self.match_location,
            side: self.side,
            opponent_id: self.opponent_id,
            opponent_name: self.opponent_name,
            legs_won,
            legs_lost,
            games_won: games.0,
            games_lost: games.1,
            overtime,
            outcome,
            points: outcome.points(),
        }
    }
}

#[derive(Debug)]
struct TeamAccumulator {
    team_name: String,
    open: Option<OpenMatch>,
    seen: HashSet<MatchId>,
    matches: Vec<MatchSummary>,
}

impl TeamAccumulator {
    fn new(team_name: String) -> Self {
        Self {
            team_name,
            open: None,
            seen: HashSet::new(),
            matches: Vec::new(),
        }
    }

    fn push(&mut self, team_id: TeamId, entry: QuarterEntry) -> Result<(), StandingsError> {
        if entry.quarter == 0 || entry.quarter > QUARTER_COUNT {
            return Err(StandingsError::UnexpectedQuarter {
                match_id: entry.match_id,
                quarter: entry.quarter,
            });
        }

        if entry.quarter == 1 {
            if let Some(open) = &self.open {
                return Err(StandingsError::MissingQuarter {
                    team_id,
                    match_id: open.match_id,
                    expected: open.next_quarter,
                    found: Some(1),
                });
            }
            if !self.seen.insert(entry.match_id) {
                return Err(StandingsError::DuplicateMatch {
                    team_id,
                    match_id: entry.match_id,
                });
            }
            let (side, opponent_id, opponent_name) = if entry.home_team == team_id {
                (Side::Home, entry.guest_team, entry.guest_team_name)
            } else if entry.guest_team == team_id {
                (Side::Guest, entry.home_team, entry.home_team_name)
            } else {
                return Err(StandingsError::TeamNotInMatch {
                    team_id,
                    match_id: entry.match_id,
                });
            };
            self.open = Some(OpenMatch {
                match_id: entry.match_id,
                match_date: entry.match_date,
                match_location: entry.match_location,
                side,
                opponent_id,
                opponent_name,
                next_quarter: 2,
                legs: entry.legs,
            });
            return Ok(());
        }

        let Some(open) = self.open.as_mut() else {
            return Err(StandingsError::MissingQuarter {
                team_id,
                match_id: entry.match_id,
                expected: 1,
                found: Some(entry.quarter),
            });
        };
        if open.match_id != entry.match_id || open.next_quarter != entry.quarter {
            return Err(StandingsError::MissingQuarter {
                team_id,
                match_id: open.match_id,
                expected: open.next_quarter,
                found: Some(entry.quarter),
            });
        }

        open.legs = ScorePair {
            guest: open
                .legs
                .guest
                .checked_add(entry.legs.guest)
                .ok_or(StandingsError::CountOverflow { team_id })?,
            home: open
                .legs
                .home
                .checked_add(entry.legs.home)
                .ok_or(StandingsError::CountOverflow { team_id })?,
        };
        open.next_quarter += 1;

        if entry.quarter == QUARTER_COUNT
            && let Some(open) = self.open.take()
        {
            self.matches.push(open.close(entry.score, entry.overtime));
        }
        Ok(())
    }
}

/// Builds the ranked standings table from store rows.
///
/// Rows of matches that are not `FINISHED` are ignored. Teams that only
/// appear with `entry = None` (or only with unfinished matches) are listed
/// with all counters at zero.
///
/// # Errors
///
/// Returns a [`StandingsError`] if the rows of a finished match are
/// incomplete or inconsistent; no partial table is produced.
pub fn aggregate<I>(rows: I) -> Result<Vec<TeamStanding>, StandingsError>
where
    I: IntoIterator<Item = StandingsRow>,
{
    let mut teams: IndexMap<TeamId, TeamAccumulator> = IndexMap::new();

    for row in rows {
        let acc = teams
            .entry(row.team_id)
            .or_insert_with(|| TeamAccumulator::new(row.team_name));
        let Some(entry) = row.entry else {
            continue;
        };
        if entry.status != MatchStatus::Finished {
            continue;
        }
        acc.push(row.team_id, entry)?;
    }

    let mut table = Vec::with_capacity(teams.len());
    for (team_id, acc) in teams {
        if let Some(open) = acc.open {
            return Err(StandingsError::MissingQuarter {
                team_id,
                match_id: open.match_id,
                expected: open.next_quarter,
                found: None,
            });
        }
        table.push(TeamStanding::from_summaries(
            team_id,
            acc.team_name,
            acc.matches,
        )?);
    }

    table.sort_by(TeamStanding::table_order);
    for (rank, standing) in (1..).zip(table.iter_mut()) {
        standing.rank = rank;
    }
    Ok(table)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct Fixture {
        match_id: MatchId,
        date: DateTime<Utc>,
        status: MatchStatus,
        home: (TeamId, &'static str),
        guest: (TeamId, &'static str),
    }

    impl Fixture {
        fn new(home: (TeamId, &'static str), guest: (TeamId, &'static str)) -> Self {
            Self {
                match_id: MatchId::new(),
                date: Utc::now(),
                status: MatchStatus::Finished,
                home,
                guest,
            }
        }

        /// Rows for one team. `legs` are `(home, guest)` per quarter,
        /// `score` and `overtime` are `(home, guest)`.
        fn rows_for(
            &self,
            team: (TeamId, &'static str),
            legs: [(u32, u32); 4],
            score: (u32, u32),
            overtime: Option<(u32, u32)>,
        ) -> Vec<StandingsRow> {
            (1u8..=4)
                .zip(legs)
                .map(|(quarter, (home, guest))| StandingsRow {
                    team_id: team.0,
                    team_name: team.1.to_string(),
                    entry: Some(QuarterEntry {
                        match_id: self.match_id,
                        match_date: self.date,
                        status: self.status,
                        home_team: self.home.0,
                        home_team_name: self.home.1.to_string(),
                        guest_team: self.guest.0,
                        guest_team_name: self.guest.1.to_string(),
                        match_location: "Club".to_string(),
                        quarter,
                        legs: ScorePair { guest, home },
                        score: if quarter == 4 {
                            ScorePair {
                                guest: score.1,
                                home: score.0,
                            }
                        } else {
                            ScorePair { guest: 0, home: 0 }
                        },
                        overtime: overtime.map(|(home, guest)| ScorePair { guest, home }),
                    }),
                })
                .collect()
        }

        fn both(
            &self,
            legs: [(u32, u32); 4],
            score: (u32, u32),
            overtime: Option<(u32, u32)>,
        ) -> Vec<StandingsRow> {
            let mut rows = self.rows_for(self.home, legs, score, overtime);
            rows.extend(self.rows_for(self.guest, legs, score, overtime));
            rows
        }
    }

    fn team(name: &'static str) -> (TeamId, &'static str) {
        (TeamId::new(), name)
    }

    fn idle(team: (TeamId, &'static str)) -> StandingsRow {
        StandingsRow {
            team_id: team.0,
            team_name: team.1.to_string(),
            entry: None,
        }
    }

    fn find<'a>(table: &'a [TeamStanding], id: TeamId) -> &'a TeamStanding {
        let Some(row) = table.iter().find(|s| s.team_id == id) else {
            panic!("team {id} missing from table");
        };
        row
    }

    #[test]
    fn regulation_win_scenario() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let rows = fixture.both([(3, 1), (2, 2), (1, 3), (2, 2)], (2, 1), None);

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        let sa = find(&table, a.0);
        let sb = find(&table, b.0);

        assert_eq!((sa.legs_won, sa.legs_lost), (8, 8));
        assert_eq!((sb.legs_won, sb.legs_lost), (8, 8));
        assert_eq!((sa.wins, sa.losses, sa.points), (1, 0, 2));
        assert_eq!((sb.wins, sb.losses, sb.points), (0, 1, 0));
        assert_eq!((sa.games_won, sa.games_lost), (2, 1));
        assert_eq!(sa.rank, 1);
        assert_eq!(sb.rank, 2);
        assert_eq!(sa.matches[0].outcome, MatchOutcome::Win);
        assert_eq!(sb.matches[0].side, Side::Guest);
        assert_eq!(sb.matches[0].opponent_name, "A");
    }

    #[test]
    fn overtime_decides_level_regulation() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let rows = fixture.both([(2, 2); 4], (2, 2), Some((1, 3)));

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        let sa = find(&table, a.0);
        let sb = find(&table, b.0);
        assert_eq!((sa.overtime_losses, sa.points), (1, 0));
        assert_eq!((sb.overtime_wins, sb.points), (1, 1));
        assert_eq!((sa.wins, sa.losses, sb.wins, sb.losses), (0, 0, 0, 0));
        assert_eq!(table[0].team_id, b.0);
    }

    #[test]
    fn tied_regulation_and_tied_overtime_counts_for_nobody() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let rows = fixture.both([(2, 2); 4], (2, 2), Some((2, 2)));

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        for standing in &table {
            assert_eq!(standing.matches_played, 1);
            assert_eq!(standing.wins + standing.losses, 0);
            assert_eq!(standing.overtime_wins + standing.overtime_losses, 0);
            assert_eq!(standing.points, 0);
            assert_eq!(standing.matches[0].outcome, MatchOutcome::Undecided);
        }
    }

    #[test]
    fn tied_regulation_without_overtime_is_undecided() {
        assert_eq!(MatchOutcome::decide((3, 3), None), MatchOutcome::Undecided);
        assert_eq!(MatchOutcome::decide((3, 3), Some((2, 1))), MatchOutcome::OvertimeWin);
        assert_eq!(MatchOutcome::decide((4, 3), Some((0, 9))), MatchOutcome::Win);
    }

    #[test]
    fn idle_teams_rank_by_name_with_zero_counters() {
        let zed = team("Zed");
        let alpha = team("Alpha");
        let mid = team("Mid");
        let rows = vec![idle(zed), idle(alpha), idle(mid)];

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        let names: Vec<&str> = table.iter().map(|s| s.team_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zed"]);
        let ranks: Vec<u32> = table.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        for s in &table {
            assert_eq!(s.matches_played, 0);
            assert_eq!(s.points + s.legs_won + s.games_won, 0);
            assert!(s.matches.is_empty());
        }
    }

    #[test]
    fn unfinished_matches_do_not_count() {
        let a = team("A");
        let b = team("B");
        let mut fixture = Fixture::new(a, b);
        fixture.status = MatchStatus::InProgress;
        let mut rows = fixture.both([(4, 0); 4], (4, 0), None);
        // An in-progress match may have partial sheets; it is skipped whole.
        rows.truncate(2);
        rows.push(idle(b));

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        assert_eq!(table.len(), 2);
        for s in &table {
            assert_eq!(s.matches_played, 0);
        }
    }

    #[test]
    fn legs_won_sum_matches_side_legs() {
        let a = team("A");
        let b = team("B");
        let c = team("C");
        let ab = Fixture::new(a, b);
        let ca = Fixture::new(c, a);
        let mut rows = ab.rows_for(a, [(3, 1), (0, 4), (2, 2), (1, 3)], (1, 3), None);
        rows.extend(ca.rows_for(a, [(1, 2), (1, 2), (4, 0), (0, 0)], (2, 1), None));

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        let sa = find(&table, a.0);
        // home in ab: 3+0+2+1, guest in ca: 2+2+0+0
        assert_eq!(sa.legs_won, 6 + 4);
        assert_eq!(sa.legs_lost, 10 + 6);
        let per_match: u32 = sa.matches.iter().map(|m| m.legs_won).sum();
        assert_eq!(per_match, sa.legs_won);
        assert_eq!((sa.wins, sa.losses), (0, 2));
    }

    #[test]
    fn ranking_breaks_ties_on_wins_then_legs() {
        let a = team("A");
        let b = team("B");
        let c = team("C");
        let d = team("D");

        // All of A, B and C end on 2 points. A and C have one regulation
        // win each, C with more legs. B has two overtime wins and no
        // regulation win.
        let mut rows = Vec::new();
        rows.extend(Fixture::new(a, d).rows_for(a, [(1, 0); 4], (3, 1), None));
        rows.extend(Fixture::new(b, d).rows_for(b, [(0, 0); 4], (1, 1), Some((2, 1))));
        rows.extend(Fixture::new(d, b).rows_for(b, [(0, 0); 4], (1, 1), Some((0, 2))));
        rows.extend(Fixture::new(c, d).rows_for(c, [(3, 0); 4], (3, 1), None));
        rows.push(idle(d));

        let Ok(table) = aggregate(rows) else {
            panic!("aggregation failed");
        };
        let order: Vec<&str> = table.iter().map(|s| s.team_name.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B", "D"]);
        let wins: Vec<u32> = table.iter().map(|s| s.wins).collect();
        assert_eq!(wins, vec![1, 1, 0, 0]);
    }

    #[test]
    fn oversized_leg_counts_fail_instead_of_overflowing() {
        let a = team("A");
        let b = team("B");
        let legs = [(u32::MAX, 0), (1, 0), (0, 0), (0, 0)];
        let rows = Fixture::new(a, b).rows_for(a, legs, (1, 0), None);

        let Err(err) = aggregate(rows) else {
            panic!("overflowing legs were accepted");
        };
        assert_eq!(err, StandingsError::CountOverflow { team_id: a.0 });
    }

    #[test]
    fn overflowing_team_totals_fail() {
        let a = team("A");
        let b = team("B");
        let first = [(u32::MAX, 0), (0, 0), (0, 0), (0, 0)];
        let second = [(1, 0), (0, 0), (0, 0), (0, 0)];
        let mut rows = Fixture::new(a, b).rows_for(a, first, (1, 0), None);
        rows.extend(Fixture::new(a, b).rows_for(a, second, (1, 0), None));

        let Err(err) = aggregate(rows) else {
            panic!("overflowing totals were accepted");
        };
        assert_eq!(err, StandingsError::CountOverflow { team_id: a.0 });
    }

    #[test]
    fn aggregation_is_deterministic() {
        let a = team("A");
        let b = team("B");
        let c = team("C");
        let mut rows = Fixture::new(a, b).both([(2, 2); 4], (2, 1), None);
        rows.extend(Fixture::new(b, c).both([(1, 3); 4], (0, 3), None));

        let (Ok(first), Ok(second)) = (aggregate(rows.clone()), aggregate(rows)) else {
            panic!("aggregation failed");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn missing_quarter_fails_the_aggregation() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let mut rows = fixture.rows_for(a, [(1, 1); 4], (2, 1), None);
        rows.remove(2);

        let result = aggregate(rows);
        assert_eq!(
            result,
            Err(StandingsError::MissingQuarter {
                team_id: a.0,
                match_id: fixture.match_id,
                expected: 3,
                found: Some(4),
            })
        );
    }

    #[test]
    fn truncated_match_fails_at_end_of_rows() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let mut rows = fixture.rows_for(a, [(1, 1); 4], (2, 1), None);
        rows.truncate(3);

        let result = aggregate(rows);
        assert!(matches!(
            result,
            Err(StandingsError::MissingQuarter {
                expected: 4,
                found: None,
                ..
            })
        ));
    }

    #[test]
    fn quarter_without_opening_row_fails() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let rows: Vec<StandingsRow> = fixture
            .rows_for(a, [(1, 1); 4], (2, 1), None)
            .into_iter()
            .skip(1)
            .collect();

        assert!(matches!(
            aggregate(rows),
            Err(StandingsError::MissingQuarter { expected: 1, .. })
        ));
    }

    #[test]
    fn duplicate_match_fails() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let mut rows = fixture.rows_for(a, [(1, 1); 4], (2, 1), None);
        rows.extend(fixture.rows_for(a, [(1, 1); 4], (2, 1), None));

        assert!(matches!(
            aggregate(rows),
            Err(StandingsError::DuplicateMatch { .. })
        ));
    }

    #[test]
    fn row_for_a_stranger_fails() {
        let a = team("A");
        let b = team("B");
        let stranger = team("S");
        let fixture = Fixture::new(a, b);
        let rows = fixture.rows_for(stranger, [(1, 1); 4], (2, 1), None);

        assert!(matches!(
            aggregate(rows),
            Err(StandingsError::TeamNotInMatch { .. })
        ));
    }

    #[test]
    fn quarter_out_of_range_fails() {
        let a = team("A");
        let b = team("B");
        let fixture = Fixture::new(a, b);
        let mut rows = fixture.rows_for(a, [(1, 1); 4], (2, 1), None);
        if let Some(entry) = rows[0].entry.as_mut() {
            entry.quarter = 7;
        }

        assert!(matches!(
            aggregate(rows),
            Err(StandingsError::UnexpectedQuarter { quarter: 7, .. })
        ));
    }
}
