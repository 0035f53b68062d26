//! Catalog API abstraction
//!
//! The synchronization pipeline talks to the external music catalog through
//! this trait so the orchestrator can be constructed with any client
//! implementation (production Spotify client, mocks in tests). No ambient
//! singletons.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider-imposed batch limit for album detail lookups.
pub const ALBUM_BATCH_LIMIT: usize = 20;

/// Provider-imposed batch limit for audio-feature lookups.
pub const FEATURE_BATCH_LIMIT: usize = 100;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API rejected the artist identifier (client-facing bad request)
    #[error("Invalid artist_id: {0}")]
    InvalidArtist(String),

    /// Network/transport error after retries were exhausted
    #[error("Network error: {0}")]
    Network(String),

    /// Token acquisition failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API returned a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse an API response
    #[error("Parse error: {0}")]
    Parse(String),

    /// A paginated listing exceeded the safety cap
    #[error("{0} listing exceeded {1} pages")]
    PageLimitExceeded(&'static str, u32),
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// URL of the next page, absent on the last page.
    pub next: Option<String>,
}

/// Album summary from the paginated album listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
}

/// Album artwork entry. The provider orders images largest first.
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

/// Full album detail from the batched detail lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl AlbumDetail {
    /// Smallest artwork URL (last entry), empty string when none exists.
    pub fn smallest_art(&self) -> String {
        self.images
            .last()
            .map(|image| image.url.clone())
            .unwrap_or_default()
    }
}

/// Artist credit on a raw track.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistCredit {
    pub id: String,
    pub name: String,
}

/// Track as listed under an album, before annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub id: String,
    pub name: String,
    pub duration_ms: i64,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
}

/// Track annotated with its parent album's name and artwork,
/// ready for normalization.
#[derive(Debug, Clone)]
pub struct RawTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: i64,
    pub artists: Vec<ArtistCredit>,
    pub album_name: String,
    pub album_art: String,
}

impl RawTrack {
    pub fn from_item(item: TrackItem, album: &AlbumDetail) -> Self {
        Self {
            id: item.id,
            name: item.name,
            duration_ms: item.duration_ms,
            artists: item.artists,
            album_name: album.name.clone(),
            album_art: album.smallest_art(),
        }
    }
}

/// Audio-feature attributes for one track.
///
/// The attribute set is provider-defined and open-ended (tempo, energy,
/// danceability, ...), so everything besides the id is kept as an extension
/// map and coerced to store-compatible strings at merge time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// External music catalog API.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// List all of an artist's albums, following pagination cursors until
    /// exhausted. Fails with [`CatalogError::InvalidArtist`] when the API
    /// rejects the identifier.
    async fn list_albums(&self, artist_id: &str) -> Result<Vec<Album>, CatalogError>;

    /// Fetch full details for a list of albums of any length; chunks into
    /// batches of [`ALBUM_BATCH_LIMIT`] internally, preserving input order.
    async fn fetch_album_details(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumDetail>, CatalogError>;

    /// List all tracks of an album, following pagination cursors, with each
    /// track annotated with the album's name and smallest artwork URL.
    async fn list_tracks(&self, album: &AlbumDetail) -> Result<Vec<RawTrack>, CatalogError>;

    /// Fetch audio features for a list of track ids of any length; chunks
    /// into batches of [`FEATURE_BATCH_LIMIT`]. Returns one entry per id in
    /// input order, `None` where the API has no analysis for that id.
    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError>;
}
