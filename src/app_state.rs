//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::LeagueConfig;
use crate::persistence::PostgresPersistence;
use crate::service::{AuthService, Mailer, MatchService, SeasonService, TeamService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sessions, password tokens and admin accounts.
    pub auth_service: Arc<AuthService>,
    /// Teams, rosters and standings.
    pub team_service: Arc<TeamService>,
    /// Match lifecycle.
    pub match_service: Arc<MatchService>,
    /// Seasons.
    pub season_service: Arc<SeasonService>,
    /// Raw store handle, used by the health check.
    pub persistence: PostgresPersistence,
}

impl AppState {
    /// Wires all services on top of one store.
    #[must_use]
    pub fn new(
        persistence: PostgresPersistence,
        mailer: Arc<dyn Mailer>,
        config: &LeagueConfig,
    ) -> Self {
        let auth = AuthService::new(persistence.clone(), mailer, config);
        Self {
            team_service: Arc::new(TeamService::new(persistence.clone(), auth.clone())),
            match_service: Arc::new(MatchService::new(persistence.clone())),
            season_service: Arc::new(SeasonService::new(persistence.clone())),
            auth_service: Arc::new(auth),
            persistence,
        }
    }
}
