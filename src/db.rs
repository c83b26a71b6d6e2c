//! PostgreSQL pool and schema migrations

use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Settings;

/// Server-side cap per statement; a commit blocked on a row lock fails
/// instead of holding its connection.
const STATEMENT_TIMEOUT: &str = "10s";

pub async fn create_pool(settings: &Settings) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(&settings.database_url)
        .context("Invalid DATABASE_URL")?
        .application_name("kaakazini-backend")
        .options([("statement_timeout", STATEMENT_TIMEOUT)]);

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await
        .context("Failed to connect to PostgreSQL")?;

    run_migrations(&pool).await?;

    tracing::info!(
        max_connections = settings.database_max_connections,
        statement_timeout = STATEMENT_TIMEOUT,
        "Database ready"
    );

    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::debug!("Schema migrations applied");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
