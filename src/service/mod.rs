//! Service layer: business logic orchestration.
//!
//! Services own a [`crate::persistence::PostgresPersistence`] handle,
//! decide who may perform an operation and log every successful mutation.
//! [`AuthService`] also owns the mailer used for password links.

pub mod auth_service;
pub mod credentials;
pub mod mailer;
pub mod match_service;
pub mod season_service;
pub mod team_service;

pub use auth_service::{AuthService, LoginOutcome, authorize_admin};
pub use mailer::{LogMailer, MailMessage, Mailer};
pub use match_service::{MatchPage, MatchService};
pub use season_service::SeasonService;
pub use team_service::{CreatedTeam, TeamService};
