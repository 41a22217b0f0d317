//! Login accounts: teams and administrators.
//!
//! Teams and admins live in the same `users` table and share one
//! credential record. The [`Role`] enum is the only discriminator; the
//! [`Account`] variant carries the fields that only make sense for a team.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AccountId;

/// Authorization role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A league team; may enter scores for its own matches.
    Team,
    /// League administrator.
    Admin,
}

impl Role {
    /// Database representation, matching the `roles.role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "TEAM",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEAM" => Ok(Self::Team),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Identity and contact data common to every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountIdentity {
    /// Account id.
    pub id: AccountId,
    /// Lowercased login name.
    pub username: String,
    /// Lowercased contact email.
    pub email: String,
}

/// An account, tagged by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// A team account.
    Team {
        /// Shared identity.
        identity: AccountIdentity,
        /// Display name of the team.
        team_name: String,
    },
    /// An administrator account.
    Admin {
        /// Shared identity.
        identity: AccountIdentity,
    },
}

impl Account {
    /// Builds the variant matching `role`. `team_name` is ignored for admins
    /// and defaults to the username for teams that have none stored.
    #[must_use]
    pub fn from_parts(identity: AccountIdentity, role: Role, team_name: Option<String>) -> Self {
        match role {
            Role::Team => {
                let team_name = team_name.unwrap_or_else(|| identity.username.clone());
                Self::Team {
                    identity,
                    team_name,
                }
            }
            Role::Admin => Self::Admin { identity },
        }
    }

    /// Returns the shared identity.
    #[must_use]
    pub const fn identity(&self) -> &AccountIdentity {
        match self {
            Self::Team { identity, .. } | Self::Admin { identity } => identity,
        }
    }

    /// Returns the role of this account.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Team { .. } => Role::Team,
            Self::Admin { .. } => Role::Admin,
        }
    }

    /// Returns the team name, if this is a team.
    #[must_use]
    pub fn team_name(&self) -> Option<&str> {
        match self {
            Self::Team { team_name, .. } => Some(team_name),
            Self::Admin { .. } => None,
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Account that owns the session.
    pub account_id: AccountId,
    /// Role of that account.
    pub role: Role,
}

impl Principal {
    /// Returns `true` for administrators.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Returns `true` if the caller is an admin or the given account.
    #[must_use]
    pub fn is_admin_or(&self, account_id: AccountId) -> bool {
        self.is_admin() || self.account_id == account_id
    }
}
