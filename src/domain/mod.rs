//! Domain layer: identifiers, accounts, match data and the standings fold.
//!
//! Nothing in here touches the database. The persistence layer converts
//! rows into these types and the services orchestrate them.

pub mod account;
pub mod ids;
pub mod league_match;
pub mod match_status;
pub mod quarter;
pub mod roster;
pub mod standings;

pub use account::{Account, AccountIdentity, Principal, Role};
pub use ids::{AccountId, MatchId, PlayerId, SeasonId, TeamId};
pub use league_match::{MatchDetail, MatchHeader, MatchUpdate, NewMatch, TeamLineup};
pub use match_status::MatchStatus;
pub use quarter::{Overtime, QuarterDetail, SideSheet};
pub use roster::{NewTeam, Player, RosterEntry, Season, Team, TeamUpdate};
pub use standings::{StandingsError, StandingsRow, TeamStanding};
