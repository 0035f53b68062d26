//! tracktempo - artist catalog sync service
//!
//! Serves an artist's track catalog from a local SQLite cache, syncing from
//! the Spotify Web API on first request and backfilling audio-feature
//! attributes through a separate opt-in endpoint.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracktempo::db::TrackStore;
use tracktempo::services::{SpotifyClient, SyncOrchestrator};
use tracktempo::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tracktempo=info,tower_http=info")),
        )
        .init();

    info!("Starting tracktempo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = tracktempo::config::load()?;
    info!("Database: {}", config.database_path.display());

    let db_pool = tracktempo::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let catalog = SpotifyClient::new(config.credentials)
        .map_err(|e| anyhow::anyhow!("Failed to create Spotify client: {}", e))?;
    let orchestrator = SyncOrchestrator::new(Arc::new(catalog), TrackStore::new(db_pool));

    let state = AppState::new(Arc::new(orchestrator));
    let app = tracktempo::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
