//! Shared test helpers: configurable mock catalog client and app builders.

use async_trait::async_trait;
use axum::Router;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use tracktempo::db::TrackStore;
use tracktempo::services::catalog::{
    Album, AlbumDetail, ArtistCredit, AudioFeatures, CatalogClient, CatalogError, Image,
    RawTrack,
};
use tracktempo::services::SyncOrchestrator;
use tracktempo::{build_router, AppState};

/// Un-annotated track as the mock catalog holds it per album.
#[derive(Clone)]
pub struct MockTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: i64,
    pub credits: Vec<(String, String)>,
}

impl MockTrack {
    pub fn new(id: &str, duration_ms: i64, credits: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Track {id}"),
            duration_ms,
            credits: credits
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        }
    }
}

/// Catalog client stub with per-operation call accounting.
#[derive(Default)]
pub struct MockCatalog {
    /// Albums served per artist id; unknown artists are rejected as invalid.
    albums_by_artist: HashMap<String, Vec<AlbumDetail>>,
    tracks_by_album: HashMap<String, Vec<MockTrack>>,
    features_by_track: HashMap<String, AudioFeatures>,
    pub list_albums_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub track_listing_calls: AtomicUsize,
    pub feature_calls: AtomicUsize,
    /// Track ids requested per feature lookup, in call order.
    pub feature_requests: Mutex<Vec<Vec<String>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_album(
        mut self,
        artist_id: &str,
        album_id: &str,
        album_name: &str,
        art_urls: &[&str],
        tracks: Vec<MockTrack>,
    ) -> Self {
        self.albums_by_artist
            .entry(artist_id.to_string())
            .or_default()
            .push(AlbumDetail {
                id: album_id.to_string(),
                name: album_name.to_string(),
                images: art_urls
                    .iter()
                    .map(|url| Image {
                        url: url.to_string(),
                    })
                    .collect(),
            });
        self.tracks_by_album.insert(album_id.to_string(), tracks);
        self
    }

    pub fn with_features(mut self, track_id: &str, features: serde_json::Value) -> Self {
        let mut object = serde_json::Map::new();
        object.insert("id".to_string(), serde_json::json!(track_id));
        if let serde_json::Value::Object(map) = features {
            object.extend(map);
        }
        self.features_by_track.insert(
            track_id.to_string(),
            serde_json::from_value(serde_json::Value::Object(object)).unwrap(),
        );
        self
    }

    pub fn catalog_calls(&self) -> usize {
        self.list_albums_calls.load(Ordering::SeqCst)
            + self.detail_calls.load(Ordering::SeqCst)
            + self.track_listing_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn list_albums(&self, artist_id: &str) -> Result<Vec<Album>, CatalogError> {
        self.list_albums_calls.fetch_add(1, Ordering::SeqCst);
        match self.albums_by_artist.get(artist_id) {
            Some(albums) => Ok(albums
                .iter()
                .map(|a| Album {
                    id: a.id.clone(),
                    name: a.name.clone(),
                })
                .collect()),
            None => Err(CatalogError::InvalidArtist(artist_id.to_string())),
        }
    }

    async fn fetch_album_details(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumDetail>, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(album_ids
            .iter()
            .filter_map(|id| {
                self.albums_by_artist
                    .values()
                    .flatten()
                    .find(|a| &a.id == id)
                    .cloned()
            })
            .collect())
    }

    async fn list_tracks(&self, album: &AlbumDetail) -> Result<Vec<RawTrack>, CatalogError> {
        self.track_listing_calls.fetch_add(1, Ordering::SeqCst);
        let tracks = self.tracks_by_album.get(&album.id).cloned().unwrap_or_default();
        Ok(tracks
            .into_iter()
            .map(|t| RawTrack {
                id: t.id,
                name: t.name,
                duration_ms: t.duration_ms,
                artists: t
                    .credits
                    .into_iter()
                    .map(|(id, name)| ArtistCredit { id, name })
                    .collect(),
                album_name: album.name.clone(),
                album_art: album.smallest_art(),
            })
            .collect())
    }

    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        self.feature_calls.fetch_add(1, Ordering::SeqCst);
        self.feature_requests.lock().await.push(track_ids.to_vec());
        Ok(track_ids
            .iter()
            .map(|id| self.features_by_track.get(id).cloned())
            .collect())
    }
}

/// Build a router over an in-memory store and the given mock catalog.
/// Returns the store too so tests can inspect persisted state directly.
pub async fn test_app(catalog: Arc<MockCatalog>) -> (Router, TrackStore) {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    tracktempo::db::init_tables(&pool).await.unwrap();

    let store = TrackStore::new(pool);
    let orchestrator = SyncOrchestrator::new(catalog, store.clone());
    let app = build_router(AppState::new(Arc::new(orchestrator)));

    (app, store)
}
