mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod engine;
mod error;
mod logging;
mod routes;
mod services;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};

use engine::Marketplace;
use services::RedisCache;
use store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        min_proof_images = settings.min_proof_images,
        "Starting Kaakazini backend"
    );

    let pool = db::create_pool(&settings).await?;

    let cache = RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await?;

    // Shared HTTP client for outbound calls
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let jwks_cache = auth::JwksCache::new(
        http_client,
        settings.jwt_jwks_url.clone(),
        settings.jwt_issuer.clone(),
        settings.jwt_audience.clone(),
        settings.jwks_cache_ttl_seconds,
    );

    if let Err(e) = jwks_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    let marketplace = Marketplace::new(
        Arc::new(PgStore::new(pool.clone())),
        settings.job_policy(),
    );

    let state = app::AppState::new(pool, settings.clone(), jwks_cache, cache, marketplace);

    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
