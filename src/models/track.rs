//! Canonical track record
//!
//! One record per (artist, track), persisted in the `tracks` table and
//! returned verbatim by the HTTP surface. Audio-feature attributes arrive
//! later via the enrichment pass and are stored as an open map of
//! already-sanitized decimal strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute whose presence marks a record as feature-complete.
///
/// The feature lookup returns the full attribute set in one shot, so checking
/// a single designated field is sufficient.
pub const FEATURE_COMPLETE_MARKER: &str = "energy";

/// Canonical track record.
///
/// `duration` doubles as the dedup key within one artist's track set: two
/// tracks with identical duration for the same artist are treated as the same
/// track and only the first survives normalization. An accepted heuristic,
/// not a perfect identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Partition key grouping all records for one artist.
    pub artist_id: String,
    /// Externally assigned unique id; merge key for feature backfill.
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    /// Smallest artwork URL, empty string when the album has no artwork.
    pub album_art: String,
    /// Duration in milliseconds.
    pub duration: i64,
    /// Audio-feature attributes, sanitized to decimal strings.
    /// Empty until the enrichment pass has run for this record; an empty map
    /// flattens to nothing, keeping the serialized shape flat either way.
    #[serde(flatten)]
    pub features: BTreeMap<String, String>,
}

impl TrackRecord {
    /// Whether this record has received its audio-feature attributes.
    pub fn is_feature_complete(&self) -> bool {
        self.features.contains_key(FEATURE_COMPLETE_MARKER)
    }
}
