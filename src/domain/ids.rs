//! Type-safe entity identifiers.
//!
//! Every persisted entity is keyed by a UUID v4. The newtypes below keep a
//! match id from being passed where a player id is expected; all of them
//! serialize transparently as the bare UUID string.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a login account (team or administrator).
    AccountId
);

entity_id!(
    /// Identifier of a rostered player.
    PlayerId
);

entity_id!(
    /// Identifier of a scheduled match.
    MatchId
);

entity_id!(
    /// Identifier of a league season.
    SeasonId
);

/// A team is an account with the team role, so it shares the account id.
pub type TeamId = AccountId;

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(MatchId::new(), MatchId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let id = PlayerId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert_eq!(s, id.as_uuid().to_string());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = SeasonId::from_uuid(uuid);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{uuid}\""));

        let Ok(back) = serde_json::from_str::<SeasonId>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }

    #[test]
    fn uuid_conversions_round_trip() {
        let uuid = uuid::Uuid::new_v4();
        let id = AccountId::from(uuid);
        assert_eq!(uuid::Uuid::from(id), uuid);
    }
}
