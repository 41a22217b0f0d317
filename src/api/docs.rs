//! OpenAPI document and Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::{dto, handlers};

/// Aggregated OpenAPI specification of the league API.
#[derive(OpenApi)]
#[openapi(
    info(title = "league-gateway", description = "League management REST API"),
    paths(
        handlers::system::health_handler,
        handlers::team::create_team,
        handlers::team::list_teams,
        handlers::team::username_is_unique,
        handlers::team::standings,
        handlers::team::get_team,
        handlers::team::update_team,
        handlers::team::archive_team,
        handlers::team::set_player_order,
        handlers::player::create_player,
        handlers::matches::create_match,
        handlers::matches::list_matches,
        handlers::matches::get_match,
        handlers::matches::update_match,
        handlers::matches::reopen_match,
        handlers::matches::create_overtime,
        handlers::matches::update_overtime,
        handlers::season::list_seasons,
        handlers::season::create_season,
        handlers::season::activate_season,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh_token,
        handlers::auth::request_password_reset,
        handlers::auth::reset_password_precheck,
        handlers::auth::reset_password,
        handlers::auth::change_password,
        handlers::auth::create_admin,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            crate::domain::Team,
            crate::domain::Player,
            crate::domain::Season,
            crate::domain::TeamStanding,
            crate::domain::MatchDetail,
            crate::domain::MatchHeader,
            crate::domain::QuarterDetail,
            crate::domain::Overtime,
            crate::domain::SideSheet,
            crate::domain::MatchStatus,
            crate::domain::Role,
            crate::service::MatchPage,
            dto::CreateTeamRequest,
            dto::CreateTeamResponse,
            dto::UpdateTeamRequest,
            dto::RosterEntryDto,
            dto::PlayerOrderRequest,
            dto::CreatePlayerRequest,
            dto::UniqueUsernameResponse,
            dto::CreateMatchRequest,
            dto::UpdateMatchRequest,
            dto::OvertimeRequest,
            dto::CreateSeasonRequest,
            dto::LoginRequest,
            dto::LoginResponse,
            dto::TokenResponse,
            dto::PasswordResetRequest,
            dto::PrecheckResponse,
            dto::ResetPasswordRequest,
            dto::ChangePasswordRequest,
            dto::CreateAdminRequest,
            dto::CreateAdminResponse,
            dto::MessageResponse,
            handlers::system::HealthResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Health check"),
        (name = "Teams", description = "Teams, rosters and standings"),
        (name = "Matches", description = "Match scheduling and score entry"),
        (name = "Seasons", description = "Season management"),
        (name = "Auth", description = "Sessions and passwords"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Serves the Swagger UI backed by the generated OpenAPI document.
#[cfg(feature = "swagger-ui")]
pub fn router() -> axum::Router<crate::app_state::AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/team/standings",
            "/api/match",
            "/api/match/{id}/overtime",
            "/api/auth/reset-token",
            "/api/seasons/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer"));
        assert!(has_bearer);
    }
}
