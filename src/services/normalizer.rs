//! Track normalization
//!
//! Converts annotated raw tracks from the catalog listing into canonical
//! [`TrackRecord`]s for one artist: drops tracks that do not credit the
//! artist (various-artist compilations), captures the matching credit's
//! display name, and deduplicates by duration within the call.

use std::collections::HashSet;

use crate::models::TrackRecord;
use crate::services::catalog::RawTrack;

/// Normalize raw tracks into canonical records for `artist_id`.
///
/// Deduplication is by `duration_ms`, first occurrence wins: a later track
/// with a duration already seen is dropped even if it is musically distinct.
/// Deliberate simplification, two pressings of the same song across albums
/// share an acoustic duration far more often than two distinct songs collide.
pub fn normalize(raw_tracks: &[RawTrack], artist_id: &str) -> Vec<TrackRecord> {
    let mut records = Vec::new();
    let mut seen_durations: HashSet<i64> = HashSet::new();

    for track in raw_tracks {
        let Some(credit) = track.artists.iter().find(|a| a.id == artist_id) else {
            continue;
        };

        if !seen_durations.insert(track.duration_ms) {
            continue;
        }

        records.push(TrackRecord {
            artist_id: artist_id.to_string(),
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_name: credit.name.clone(),
            album_name: track.album_name.clone(),
            album_art: track.album_art.clone(),
            duration: track.duration_ms,
            features: Default::default(),
        });
    }

    tracing::debug!(
        artist_id,
        raw = raw_tracks.len(),
        kept = records.len(),
        "Normalized track listing"
    );

    records
}
