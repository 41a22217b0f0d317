//! Match service: scheduling, score entry and the read side.
//!
//! Payloads arrive already validated as domain commands. This layer checks
//! who may touch a match and hands the write to the store, which runs it
//! in a single transaction.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::auth_service::authorize_admin;
use crate::domain::{
    MatchDetail, MatchHeader, MatchId, MatchStatus, MatchUpdate, NewMatch, Overtime, Principal,
    QuarterDetail,
};
use crate::error::LeagueError;
use crate::persistence::PostgresPersistence;

/// Default page size of the match listing.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of match headers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchPage {
    /// Headers on this page, newest first.
    pub items: Vec<MatchHeader>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Number of matches overall.
    pub total: i64,
}

/// Orchestrates the match lifecycle.
#[derive(Debug, Clone)]
pub struct MatchService {
    store: PostgresPersistence,
}

impl MatchService {
    /// Creates a new `MatchService`.
    #[must_use]
    pub fn new(store: PostgresPersistence) -> Self {
        Self { store }
    }

    /// Schedules a match and seeds its four quarters.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin or
    /// one of the two teams, [`LeagueError::NotFound`] for an unknown
    /// team, or [`LeagueError::Persistence`] if any write fails (nothing
    /// is stored then).
    pub async fn create_match(
        &self,
        principal: &Principal,
        new: NewMatch,
    ) -> Result<MatchDetail, LeagueError> {
        if !(principal.is_admin_or(new.home.team) || principal.is_admin_or(new.guest.team)) {
            return Err(LeagueError::Forbidden(
                "only an admin or a participating team may create a match".to_string(),
            ));
        }

        let id = MatchId::new();
        self.store.create_match(id, &new).await?;
        tracing::info!(
            match_id = %id,
            home_team = %new.home.team,
            guest_team = %new.guest.team,
            "match created"
        );
        self.get_match(id).await
    }

    /// Replaces the status and all four quarter sheets.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] for an unknown match,
    /// [`LeagueError::Forbidden`] for outsiders, [`LeagueError::Conflict`]
    /// if the match is finished or the status change is not allowed, or
    /// [`LeagueError::Persistence`] if a write step misses its row.
    pub async fn update_match(
        &self,
        principal: &Principal,
        id: MatchId,
        status: MatchStatus,
        quarters: Vec<QuarterDetail>,
    ) -> Result<MatchDetail, LeagueError> {
        self.authorize_participant(principal, id).await?;

        let update = MatchUpdate {
            status,
            changed_by: principal.account_id,
            quarters,
        };
        self.store.update_match(id, &update).await?;
        tracing::info!(match_id = %id, status = %status, "match updated");
        self.get_match(id).await
    }

    /// Reopens a finished match.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Forbidden`] unless the caller is an admin,
    /// [`LeagueError::NotFound`] for an unknown match, or
    /// [`LeagueError::Conflict`] unless the match is finished.
    pub async fn reopen_match(
        &self,
        principal: &Principal,
        id: MatchId,
    ) -> Result<MatchDetail, LeagueError> {
        authorize_admin(principal)?;
        self.store
            .reopen_match(id, principal.account_id, Utc::now())
            .await?;
        tracing::info!(match_id = %id, "match reopened");
        self.get_match(id).await
    }

    /// Records the overtime of an editable match.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] for an unknown match,
    /// [`LeagueError::Forbidden`] for outsiders, or
    /// [`LeagueError::Conflict`] if the match is finished or already has
    /// an overtime.
    pub async fn create_overtime(
        &self,
        principal: &Principal,
        id: MatchId,
        overtime: Overtime,
    ) -> Result<MatchDetail, LeagueError> {
        self.authorize_participant(principal, id).await?;
        self.store.create_overtime(id, &overtime).await?;
        tracing::info!(match_id = %id, "overtime created");
        self.get_match(id).await
    }

    /// Replaces the overtime of an editable match.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] for an unknown match or missing
    /// overtime, [`LeagueError::Forbidden`] for outsiders, or
    /// [`LeagueError::Conflict`] if the match is finished.
    pub async fn update_overtime(
        &self,
        principal: &Principal,
        id: MatchId,
        overtime: Overtime,
    ) -> Result<MatchDetail, LeagueError> {
        self.authorize_participant(principal, id).await?;
        self.store.update_overtime(id, &overtime).await?;
        tracing::info!(match_id = %id, "overtime updated");
        self.get_match(id).await
    }

    /// Lists matches by date, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::Validation`] for a page below 1 or a limit
    /// outside `1..=100`.
    pub async fn list_matches(&self, page: u32, limit: u32) -> Result<MatchPage, LeagueError> {
        if page == 0 {
            return Err(LeagueError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(LeagueError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = i64::from(page - 1) * i64::from(limit);
        let (items, total) = self.store.list_matches(i64::from(limit), offset).await?;
        Ok(MatchPage {
            items,
            page,
            limit,
            total,
        })
    }

    /// Loads a match with quarters and overtime.
    ///
    /// # Errors
    ///
    /// Returns [`LeagueError::NotFound`] for an unknown id.
    pub async fn get_match(&self, id: MatchId) -> Result<MatchDetail, LeagueError> {
        self.store
            .get_match(id)
            .await?
            .ok_or_else(|| LeagueError::not_found("match", id))
    }

    async fn authorize_participant(
        &self,
        principal: &Principal,
        id: MatchId,
    ) -> Result<(), LeagueError> {
        let header = self
            .store
            .match_header(id)
            .await?
            .ok_or_else(|| LeagueError::not_found("match", id))?;
        if principal.is_admin_or(header.home_team) || principal.is_admin_or(header.guest_team) {
            Ok(())
        } else {
            Err(LeagueError::Forbidden(format!(
                "only an admin or a team playing match {id} may edit it"
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn service() -> MatchService {
        let Ok(store) = PostgresPersistence::connect_lazy("postgres://nobody@127.0.0.1:1/none")
        else {
            panic!("lazy pool");
        };
        MatchService::new(store)
    }

    #[tokio::test]
    async fn pagination_bounds_are_checked_before_querying() {
        let matches = service();
        assert!(matches!(
            matches.list_matches(0, 10).await,
            Err(LeagueError::Validation(_))
        ));
        assert!(matches!(
            matches.list_matches(1, 0).await,
            Err(LeagueError::Validation(_))
        ));
        assert!(matches!(
            matches.list_matches(1, MAX_PAGE_SIZE + 1).await,
            Err(LeagueError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_create_matches() {
        use crate::domain::{AccountId, PlayerId, Role, TeamLineup};

        let lineup = |team| TeamLineup {
            team,
            captain: PlayerId::new(),
            positions: vec![Some(PlayerId::new()); 3],
        };
        let new = NewMatch {
            created_at: Utc::now(),
            created_by: AccountId::new(),
            home: lineup(AccountId::new()),
            guest: lineup(AccountId::new()),
            location: "Bar".to_string(),
            match_date: Utc::now(),
        };
        let outsider = Principal {
            account_id: AccountId::new(),
            role: Role::Team,
        };
        assert!(matches!(
            service().create_match(&outsider, new).await,
            Err(LeagueError::Forbidden(_))
        ));
    }
}
