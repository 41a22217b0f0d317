//! Match lifecycle status and its allowed transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a match.
///
/// ```text
/// NEW ──► IN_PROGRESS ──► FINISHED ──(reopen)──► REOPENED
///  │          ▲   │           ▲                     │
///  │          └───┘           │                     │
///  └──────────────────────────┘◄────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Scheduled, no scores entered yet.
    New,
    /// Scores are being entered.
    InProgress,
    /// A finished match opened again by an admin.
    Reopened,
    /// Final; contributes to standings.
    Finished,
}

impl MatchStatus {
    /// Database representation, matching the `matches.status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Reopened => "REOPENED",
            Self::Finished => "FINISHED",
        }
    }

    /// Scores may be edited in every status except `FINISHED`.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Finished)
    }

    /// Whether a score update may move the match from `self` to `next`.
    ///
    /// Reopening is not a score update and goes through
    /// [`MatchStatus::can_reopen`].
    #[must_use]
    pub const fn can_update_to(self, next: Self) -> bool {
        self.is_editable() && matches!(next, Self::InProgress | Self::Finished)
    }

    /// Only finished matches can be reopened.
    #[must_use]
    pub const fn can_reopen(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "REOPENED" => Ok(Self::Reopened),
            "FINISHED" => Ok(Self::Finished),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MatchStatus; 4] = [
        MatchStatus::New,
        MatchStatus::InProgress,
        MatchStatus::Reopened,
        MatchStatus::Finished,
    ];

    #[test]
    fn db_text_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<MatchStatus>(), Ok(status));
        }
        assert!("DONE".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn finished_is_frozen_for_updates() {
        for next in ALL {
            assert!(!MatchStatus::Finished.can_update_to(next));
        }
    }

    #[test]
    fn updates_target_in_progress_or_finished() {
        for from in [MatchStatus::New, MatchStatus::InProgress, MatchStatus::Reopened] {
            assert!(from.can_update_to(MatchStatus::InProgress));
            assert!(from.can_update_to(MatchStatus::Finished));
            assert!(!from.can_update_to(MatchStatus::New));
            assert!(!from.can_update_to(MatchStatus::Reopened));
        }
    }

    #[test]
    fn only_finished_reopens() {
        assert!(MatchStatus::Finished.can_reopen());
        assert!(!MatchStatus::New.can_reopen());
        assert!(!MatchStatus::InProgress.can_reopen());
        assert!(!MatchStatus::Reopened.can_reopen());
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&MatchStatus::InProgress).ok();
        assert_eq!(json.as_deref(), Some("\"IN_PROGRESS\""));
    }
}
