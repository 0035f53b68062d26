//! Synchronization orchestration
//!
//! The top-level decision procedure per artist request: cache hit vs miss vs
//! partial. A miss on the primary path drives fetch → normalize → persist;
//! a partial set on the enrichment path drives fetch-features → merge →
//! persist. Once cached, base metadata is never refreshed; only the
//! missing-feature backfill mutates existing records.

use std::sync::Arc;
use thiserror::Error;

use crate::db::TrackStore;
use crate::models::TrackRecord;
use crate::services::catalog::{CatalogClient, CatalogError};
use crate::services::{merger, normalizer};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Outcome of the feature-enrichment path.
#[derive(Debug)]
pub enum FeatureSync {
    /// The artist has never been synced; the caller should invoke the
    /// primary listing endpoint first. A typed state, not an error.
    NotLoaded,
    /// The artist's records, every one as feature-complete as the external
    /// analysis allows.
    Tracks(Vec<TrackRecord>),
}

/// Drives the synchronization pipeline against an injected catalog client
/// and store adapter.
pub struct SyncOrchestrator {
    catalog: Arc<dyn CatalogClient>,
    store: TrackStore,
}

impl SyncOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogClient>, store: TrackStore) -> Self {
        Self { catalog, store }
    }

    /// Primary listing path: return the artist's cached records, syncing
    /// from the catalog first when the artist has never been seen.
    pub async fn artist_tracks(&self, artist_id: &str) -> Result<Vec<TrackRecord>, SyncError> {
        if let Some(tracks) = self.store.query_by_artist(artist_id).await? {
            tracing::debug!(artist_id, count = tracks.len(), "Cache hit");
            return Ok(tracks);
        }

        tracing::info!(artist_id, "Cache miss, syncing from catalog");

        let records = self.sync_from_catalog(artist_id).await?;
        self.store.write_batch(&records).await?;

        // Re-query so the response carries the store-canonical shape
        let tracks = self
            .store
            .query_by_artist(artist_id)
            .await?
            .unwrap_or_default();

        tracing::info!(artist_id, count = tracks.len(), "Initial sync complete");

        Ok(tracks)
    }

    /// Feature-enrichment path: backfill audio-feature attributes for
    /// exactly the records that lack them.
    ///
    /// Feature lookups are the expensive, rate-limited side of the external
    /// API, so records that already carry features are never re-fetched, and
    /// the primary listing path never fetches features at all.
    pub async fn artist_audio_features(
        &self,
        artist_id: &str,
    ) -> Result<FeatureSync, SyncError> {
        let Some(tracks) = self.store.query_by_artist(artist_id).await? else {
            tracing::debug!(artist_id, "Feature request for unsynced artist");
            return Ok(FeatureSync::NotLoaded);
        };

        let mut pending: Vec<TrackRecord> = tracks
            .iter()
            .filter(|t| !t.is_feature_complete())
            .cloned()
            .collect();

        if pending.is_empty() {
            tracing::debug!(artist_id, count = tracks.len(), "All records feature-complete");
            return Ok(FeatureSync::Tracks(tracks));
        }

        tracing::info!(
            artist_id,
            pending = pending.len(),
            total = tracks.len(),
            "Fetching audio features for incomplete records"
        );

        let ids: Vec<String> = pending.iter().map(|t| t.track_id.clone()).collect();

        // The lookup is null-tolerant: ids without analysis come back as
        // None and those records simply stay incomplete.
        let features: Vec<_> = self
            .catalog
            .fetch_audio_features(&ids)
            .await?
            .into_iter()
            .flatten()
            .collect();

        merger::merge(&mut pending, &features);
        self.store.write_batch(&pending).await?;

        let tracks = self
            .store
            .query_by_artist(artist_id)
            .await?
            .unwrap_or_default();

        Ok(FeatureSync::Tracks(tracks))
    }

    /// Full catalog walk: albums → batched details → per-album track
    /// listings → normalization.
    async fn sync_from_catalog(&self, artist_id: &str) -> Result<Vec<TrackRecord>, SyncError> {
        let albums = self.catalog.list_albums(artist_id).await?;
        let album_ids: Vec<String> = albums.iter().map(|a| a.id.clone()).collect();

        let details = self.catalog.fetch_album_details(&album_ids).await?;

        let mut raw_tracks = Vec::new();
        for detail in &details {
            raw_tracks.extend(self.catalog.list_tracks(detail).await?);
        }

        tracing::debug!(
            artist_id,
            albums = details.len(),
            raw_tracks = raw_tracks.len(),
            "Catalog walk complete"
        );

        Ok(normalizer::normalize(&raw_tracks, artist_id))
    }
}
