//! league-gateway server entry point.
//!
//! Connects to PostgreSQL, applies migrations, ensures an admin exists and
//! starts the Axum HTTP server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use league_gateway::api;
use league_gateway::app_state::AppState;
use league_gateway::config::{LeagueConfig, LogFormat};
use league_gateway::persistence::PostgresPersistence;
use league_gateway::service::{LogMailer, Mailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LeagueConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting league-gateway");

    let persistence = PostgresPersistence::connect(&config)
        .await
        .context("connecting to database")?;
    if config.run_migrations {
        persistence.migrate().await.context("running migrations")?;
        tracing::info!("migrations applied");
    }

    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let app_state = AppState::new(persistence, mailer, &config);

    if let Some((username, email)) = &config.bootstrap_admin {
        app_state
            .auth_service
            .ensure_bootstrap_admin(username, email)
            .await
            .context("creating bootstrap admin")?;
    }

    let app = api::build_router()
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("binding listener")?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown signal received");
}
