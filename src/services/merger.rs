//! Feature merge and value sanitization
//!
//! Merges audio-feature lookup results into previously stored track records
//! and coerces attribute values to store-compatible representations. The
//! store does not accept raw floating-point values, so every numeric
//! attribute becomes its decimal-string form before persistence. Base track
//! fields need no such pass: they live in typed store columns (`duration` is
//! an integer column), so only the open-ended feature map is coerced here.

use std::collections::BTreeMap;

use crate::models::TrackRecord;
use crate::services::catalog::AudioFeatures;

/// Coerce feature attribute values to store-compatible strings.
///
/// Numbers and booleans become their canonical string form, strings pass
/// through unchanged, and structured values (arrays, objects, nulls) are
/// dropped, the persisted record is a flat mapping. Idempotent: sanitizing
/// already-sanitized values is a no-op.
pub fn sanitize(
    attributes: &BTreeMap<String, serde_json::Value>,
) -> BTreeMap<String, String> {
    let mut sanitized = BTreeMap::new();

    for (key, value) in attributes {
        let coerced = match value {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::String(s) => s.clone(),
            _ => continue,
        };
        sanitized.insert(key.clone(), coerced);
    }

    sanitized
}

/// Merge feature lookup results into track records in place.
///
/// Each track is matched against the feature entry whose id equals its
/// `track_id`; a track with no match is left unmodified and stays
/// feature-incomplete (retried on a future enrichment call). Matched
/// attributes are shallow-merged over any existing feature fields.
pub fn merge(tracks: &mut [TrackRecord], features: &[AudioFeatures]) {
    for track in tracks.iter_mut() {
        let Some(feature) = features.iter().find(|f| f.id == track.track_id) else {
            continue;
        };
        track.features.extend(sanitize(&feature.attributes));
    }
}
