//! Artist catalog endpoints
//!
//! - `GET /artist/{artist_id}` — cached track listing, syncing from the
//!   catalog on first sight of the artist.
//! - `GET /artist/{artist_id}/audio-features` — same listing after the
//!   feature backfill pass; `{"error": "Artist not loaded"}` when the artist
//!   has never been synced.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::models::TrackRecord;
use crate::services::FeatureSync;
use crate::AppState;

/// Track listing response envelope
#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<TrackRecord>,
}

/// GET /artist/:artist_id
pub async fn artist_tracks(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
) -> ApiResult<Json<TracksResponse>> {
    let tracks = state.orchestrator.artist_tracks(&artist_id).await?;
    Ok(Json(TracksResponse { tracks }))
}

/// GET /artist/:artist_id/audio-features
///
/// "Artist not loaded" is a typed empty-result state, not a failure: the
/// caller is expected to hit the primary listing endpoint first. Served with
/// 200 to match the original surface.
pub async fn artist_audio_features(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
) -> ApiResult<Response> {
    let response = match state.orchestrator.artist_audio_features(&artist_id).await? {
        FeatureSync::NotLoaded => Json(json!({"error": "Artist not loaded"})).into_response(),
        FeatureSync::Tracks(tracks) => Json(TracksResponse { tracks }).into_response(),
    };
    Ok(response)
}

/// Build artist routes
pub fn artist_routes() -> Router<AppState> {
    Router::new()
        .route("/artist/:artist_id", get(artist_tracks))
        .route("/artist/:artist_id/audio-features", get(artist_audio_features))
}
