//! tgb-worker entry point.
//!
//! Deploy-time precache warmer: installs the current manifest into the
//! versioned bucket, then activates it, evicting superseded buckets.
//! Logging goes to stderr as JSON.

use anyhow::Result;
use std::sync::Arc;
use tgb_client::fetch::{FetchClient, FetchConfig};
use tgb_core::{AppConfig, CacheDb};
use tgb_worker::{CacheController, Registration};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(bucket = %config.cache_name, urls = config.precache_urls.len(), "starting precache warm");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..FetchConfig::default()
    })?);

    let controller = CacheController::new(db.clone(), network, &config)?;
    let mut registration = Registration::new(controller);

    registration.install().await?;
    registration.activate().await?;

    let entries = db.count_entries(&config.cache_name).await?;
    tracing::info!(bucket = %config.cache_name, entries, "worker active");

    Ok(())
}
