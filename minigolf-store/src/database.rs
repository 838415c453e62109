use minigolf_core::CoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Store failures reach callers as persistence errors; the detail is logged
/// by the HTTP layer, never shown to clients.
pub(crate) fn db_err(err: sqlx::Error) -> CoreError {
    CoreError::PersistenceError(err.to_string())
}

/// Text columns holding enum values (status, difficulty).
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
{
    value
        .parse()
        .map_err(|_| CoreError::PersistenceError(format!("Unexpected {} value in database: {}", column, value)))
}
