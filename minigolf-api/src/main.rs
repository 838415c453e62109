use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use minigolf_api::{app, AppState};
use minigolf_store::app_config::{Config, StoreBackend};
use minigolf_store::{DbClient, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minigolf_api=debug,minigolf_core=info,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting minigolf API on port {}", config.server.port);
    if config.auth.uses_shipped_defaults() {
        tracing::warn!("Admin password or JWT secret is still the shipped default; override them via MINIGOLF__AUTH__*");
    }

    let state = match config.store.backend {
        StoreBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            if config.database.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }
            AppState::postgres(&db, config.auth.clone(), config.rate_limit.clone())
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; nothing survives a restart");
            AppState::in_memory(config.auth.clone(), config.rate_limit.clone())
        }
    };

    let state = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url)
                .await
                .context("Failed to configure Redis")?;
            state.with_redis(Arc::new(client))
        }
        None => {
            tracing::info!("No Redis configured, rate limiting disabled");
            state
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
