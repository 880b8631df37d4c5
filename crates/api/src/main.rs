#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Penbun API Server
//!
//! Serves login, refresh and logout, the token-gated `/me` identity route
//! and an unauthenticated health check.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use penbun_shared::{create_pool, ensure_users_table, upsert_user};
use sqlx::PgPool;
use tokio::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use penbun_api::{
    auth::{hash_password, spawn_sweeper, PgCredentialStore, SystemClock},
    config::{Config, LogFormat, SeedUser},
    routes::create_router,
    security::security_headers_middleware,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Configuration decides the log format, so it is loaded first
    let config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,penbun_api=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Penbun API Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(?config, "Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connection established");

    if let Some(seed) = &config.seed_user {
        seed_user(&pool, seed).await?;
    }

    let clock = Arc::new(SystemClock);
    let state = AppState::new(
        config.clone(),
        Arc::new(PgCredentialStore::new(pool.clone())),
        clock.clone(),
    );

    let sweep_every = Duration::from_secs(config.revocation_sweep_secs);
    let sweeper = spawn_sweeper(state.sessions.revocations().clone(), clock, sweep_every);
    tracing::info!(
        interval_secs = config.revocation_sweep_secs,
        "Revocation sweeper task started"
    );

    // Build CORS layer - restrict to allowed origins only
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    tracing::info!(
        allowed_origins = ?allowed_origins,
        "CORS configured with {} allowed origins",
        allowed_origins.len()
    );

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = create_router(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Create the development user, replacing its hash if it already exists
async fn seed_user(pool: &PgPool, seed: &SeedUser) -> anyhow::Result<()> {
    ensure_users_table(pool).await?;

    let password = seed.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    upsert_user(pool, &seed.username, &password_hash).await?;

    tracing::info!(username = %seed.username, "Seed user ready");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
