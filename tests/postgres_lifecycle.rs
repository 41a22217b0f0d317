//! End-to-end lifecycle against a real PostgreSQL database.
//!
//! Runs only when `LEAGUE_TEST_DATABASE_URL` is set; every name it creates
//! is suffixed with a random id so reruns do not collide.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::Utc;
use league_gateway::app_state::AppState;
use league_gateway::config::LeagueConfig;
use league_gateway::domain::{
    AccountId, MatchStatus, NewMatch, NewTeam, Principal, QuarterDetail, Role, SideSheet,
    TeamLineup,
};
use league_gateway::error::LeagueError;
use league_gateway::persistence::{PostgresPersistence, TokenPurpose};
use league_gateway::service::{LogMailer, Mailer};
use sqlx::PgPool;

fn database_url() -> Option<String> {
    std::env::var("LEAGUE_TEST_DATABASE_URL").ok()
}

async fn raw_pool(url: &str) -> PgPool {
    let Ok(pool) = PgPool::connect(url).await else {
        panic!("database unreachable at {url}");
    };
    pool
}

async fn state() -> Option<AppState> {
    let url = database_url()?;
    let Ok(config) = LeagueConfig::from_lookup(|key| {
        (key == "DATABASE_URL").then(|| url.clone())
    }) else {
        panic!("config must parse");
    };
    let Ok(store) = PostgresPersistence::connect(&config).await else {
        panic!("database unreachable at {url}");
    };
    if let Err(e) = store.migrate().await {
        panic!("migrations failed: {e}");
    }
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    Some(AppState::new(store, mailer, &config))
}

fn admin() -> Principal {
    Principal {
        account_id: AccountId::new(),
        role: Role::Admin,
    }
}

fn new_team(tag: &str, suffix: &str) -> NewTeam {
    NewTeam {
        id: AccountId::new(),
        username: format!("{tag}-{suffix}"),
        email: format!("{tag}-{suffix}@example.com"),
        team_name: format!("{tag} {suffix}"),
        players: vec!["One".into(), "Two".into(), "Three".into()],
    }
}

fn side(positions: &[Option<league_gateway::domain::PlayerId>], legs: Vec<u32>, score: u32) -> SideSheet {
    SideSheet {
        positions: positions.to_vec(),
        legs,
        score,
    }
}

#[tokio::test]
async fn match_lifecycle_feeds_standings() {
    let Some(state) = state().await else {
        return;
    };
    let admin = admin();
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    let Ok(home) = state
        .team_service
        .create_team(&admin, new_team("home", &suffix))
        .await
    else {
        panic!("home team");
    };
    let Ok(guest) = state
        .team_service
        .create_team(&admin, new_team("guest", &suffix))
        .await
    else {
        panic!("guest team");
    };

    let lineup = |team: &league_gateway::domain::Team| {
        let mut positions: Vec<_> = team.players.iter().map(|p| Some(p.id)).collect();
        positions.resize(8, None);
        let Some(captain) = team.players.first() else {
            panic!("team has players");
        };
        TeamLineup {
            team: team.id,
            captain: captain.id,
            positions,
        }
    };
    let home_lineup = lineup(&home.team);
    let guest_lineup = lineup(&guest.team);

    // A captain from the other team is rejected before anything is stored.
    let mut bad = lineup(&home.team);
    bad.captain = guest_lineup.captain;
    let rejected = state
        .match_service
        .create_match(
            &admin,
            NewMatch {
                created_at: Utc::now(),
                created_by: admin.account_id,
                home: bad,
                guest: guest_lineup.clone(),
                location: "Clubhouse".into(),
                match_date: Utc::now(),
            },
        )
        .await;
    assert!(matches!(rejected, Err(LeagueError::Validation(_))));

    let Ok(created) = state
        .match_service
        .create_match(
            &admin,
            NewMatch {
                created_at: Utc::now(),
                created_by: admin.account_id,
                home: home_lineup.clone(),
                guest: guest_lineup.clone(),
                location: "Clubhouse".into(),
                match_date: Utc::now(),
            },
        )
        .await
    else {
        panic!("match must be created");
    };
    assert_eq!(created.header.status, MatchStatus::New);
    assert_eq!(created.quarters.len(), 4);

    // Home wins every quarter 3:1 on games with 4:2 legs.
    let quarters: Vec<QuarterDetail> = (1..=4)
        .map(|quarter| QuarterDetail {
            quarter,
            guest: side(&guest_lineup.positions, vec![1, 1, 0, 0], 1),
            home: side(&home_lineup.positions, vec![1, 1, 1, 1], 3),
        })
        .collect();
    let Ok(finished) = state
        .match_service
        .update_match(&admin, created.header.id, MatchStatus::Finished, quarters.clone())
        .await
    else {
        panic!("update must succeed");
    };
    assert_eq!(finished.header.status, MatchStatus::Finished);

    // Finished matches are frozen until reopened.
    let frozen = state
        .match_service
        .update_match(&admin, created.header.id, MatchStatus::InProgress, quarters)
        .await;
    assert!(matches!(frozen, Err(LeagueError::Conflict(_))));

    let Ok(table) = state.team_service.standings().await else {
        panic!("standings must compute");
    };
    let Some(home_row) = table.iter().find(|row| row.team_id == home.team.id) else {
        panic!("home team listed");
    };
    let Some(guest_row) = table.iter().find(|row| row.team_id == guest.team.id) else {
        panic!("guest team listed");
    };
    assert_eq!(home_row.wins, 1);
    assert_eq!(home_row.points, 2);
    assert_eq!(home_row.legs_won, 16);
    assert_eq!(guest_row.losses, 1);
    assert_eq!(guest_row.points, 0);
    assert!(home_row.rank < guest_row.rank);

    let Ok(reopened) = state
        .match_service
        .reopen_match(&admin, created.header.id)
        .await
    else {
        panic!("reopen must succeed");
    };
    assert_eq!(reopened.header.status, MatchStatus::Reopened);

    // Activating seasons in turn always leaves exactly one active.
    let Ok((season_admin_id, _)) = state
        .auth_service
        .create_admin(&format!("seasons-{suffix}"), &format!("seasons-{suffix}@example.com"))
        .await
    else {
        panic!("admin account");
    };
    let season_admin = Principal {
        account_id: season_admin_id,
        role: Role::Admin,
    };
    let mut seasons = Vec::new();
    for name in ["Spring", "Autumn"] {
        let Ok(season) = state
            .season_service
            .create_season(&season_admin, &format!("{name} {suffix}"))
            .await
        else {
            panic!("season {name}");
        };
        seasons.push(season.id);
    }
    let Some(url) = database_url() else {
        panic!("url was read above");
    };
    let pool = raw_pool(&url).await;
    for id in seasons.iter().chain(seasons.iter().rev()) {
        assert!(state.season_service.activate_season(&season_admin, *id).await.is_ok());
        let Ok(active) =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seasons WHERE is_active")
                .fetch_one(&pool)
                .await
        else {
            panic!("count active seasons");
        };
        assert_eq!(active, 1);
        let Ok(flag) = sqlx::query_scalar::<_, bool>("SELECT is_active FROM seasons WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_one(&pool)
            .await
        else {
            panic!("season row");
        };
        assert!(flag);
    }

    for id in [home.team.id, guest.team.id] {
        assert!(state.team_service.archive_team(&admin, id).await.is_ok());
    }
}

#[tokio::test]
async fn failed_quarter_write_rolls_back_the_whole_update() {
    let Some(state) = state().await else {
        return;
    };
    let Some(url) = database_url() else {
        return;
    };
    let pool = raw_pool(&url).await;
    let admin = admin();
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    let mut teams = Vec::new();
    for tag in ["left", "right"] {
        let Ok(created) = state
            .team_service
            .create_team(&admin, new_team(tag, &suffix))
            .await
        else {
            panic!("team {tag}");
        };
        teams.push(created.team);
    }
    let [home, guest] = teams.as_slice() else {
        panic!("two teams");
    };
    let lineup = |team: &league_gateway::domain::Team| {
        let mut positions: Vec<_> = team.players.iter().map(|p| Some(p.id)).collect();
        positions.resize(8, None);
        let Some(captain) = team.players.first() else {
            panic!("team has players");
        };
        TeamLineup {
            team: team.id,
            captain: captain.id,
            positions,
        }
    };
    let (home_lineup, guest_lineup) = (lineup(home), lineup(guest));

    let Ok(created) = state
        .match_service
        .create_match(
            &admin,
            NewMatch {
                created_at: Utc::now(),
                created_by: admin.account_id,
                home: home_lineup.clone(),
                guest: guest_lineup.clone(),
                location: "Clubhouse".into(),
                match_date: Utc::now(),
            },
        )
        .await
    else {
        panic!("match must be created");
    };
    let match_id = created.header.id;

    // Quarter 4 disappears behind the service's back.
    let Ok(deleted) =
        sqlx::query("DELETE FROM match_details WHERE match_id = $1 AND quarter = 4")
            .bind(match_id.as_uuid())
            .execute(&pool)
            .await
    else {
        panic!("delete quarter 4");
    };
    assert_eq!(deleted.rows_affected(), 1);

    let quarters: Vec<QuarterDetail> = (1..=4)
        .map(|quarter| QuarterDetail {
            quarter,
            guest: side(&guest_lineup.positions, vec![2, 2, 2, 2], 2),
            home: side(&home_lineup.positions, vec![1, 1, 1, 1], 1),
        })
        .collect();
    let result = state
        .match_service
        .update_match(&admin, match_id, MatchStatus::Finished, quarters)
        .await;
    assert!(matches!(result, Err(LeagueError::Persistence(_))));

    let Ok(after) = state.match_service.get_match(match_id).await else {
        panic!("match still readable");
    };
    assert_eq!(after.header.status, MatchStatus::New);
    let numbers: Vec<u8> = after.quarters.iter().map(|q| q.quarter).collect();
    assert_eq!(numbers, [1, 2, 3]);
    for quarter in &after.quarters {
        assert_eq!(quarter.guest.legs, vec![0; 4]);
        assert_eq!(quarter.home.legs, vec![0; 4]);
        assert_eq!((quarter.guest.score, quarter.home.score), (0, 0));
    }

    // The match never finishes, so it stays out of the standings; archive
    // the teams so the broken match is not listed under active teams.
    for id in [home.id, guest.id] {
        assert!(state.team_service.archive_team(&admin, id).await.is_ok());
    }
}

#[tokio::test]
async fn consumed_password_token_cannot_be_reused() {
    let Some(state) = state().await else {
        return;
    };
    let admin = admin();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let Ok(created) = state
        .team_service
        .create_team(&admin, new_team("token", &suffix))
        .await
    else {
        panic!("team");
    };

    let issued = state.auth_service.issue_password_token(TokenPurpose::Reset);
    let stored = state
        .persistence
        .store_password_token(created.team.id, &issued.record)
        .await;
    assert!(stored.is_ok());
    assert!(matches!(
        state.auth_service.password_token_is_valid(&issued.token).await,
        Ok(true)
    ));

    let first = state
        .auth_service
        .reset_password(&issued.token, "first-password")
        .await;
    assert!(first.is_ok());
    assert!(matches!(
        state.auth_service.password_token_is_valid(&issued.token).await,
        Ok(false)
    ));

    let second = state
        .auth_service
        .reset_password(&issued.token, "second-password")
        .await;
    assert!(matches!(second, Err(LeagueError::InvalidPasswordToken)));

    let login = state
        .auth_service
        .login(&format!("token-{suffix}"), "first-password")
        .await;
    assert!(login.is_ok());

    assert!(state.team_service.archive_team(&admin, created.team.id).await.is_ok());
}
