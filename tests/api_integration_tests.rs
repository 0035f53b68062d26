//! End-to-end tests driving the router with a mock catalog client.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

use helpers::{test_app, MockCatalog, MockTrack};

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn two_track_catalog() -> MockCatalog {
    MockCatalog::new().with_album(
        "A1",
        "AL1",
        "Album One",
        &["https://img/640", "https://img/64"],
        vec![
            MockTrack::new("T1", 100, &[("A1", "Artist One")]),
            MockTrack::new("T2", 200, &[("A1", "Artist One")]),
        ],
    )
}

/// Scenario 1: first request syncs two tracks; a second request is served
/// from the cache without touching the catalog again.
#[tokio::test]
async fn initial_sync_then_cache_hit() {
    let catalog = Arc::new(two_track_catalog());
    let (app, _store) = test_app(catalog.clone()).await;

    let (status, body) = get(&app, "/artist/A1").await;
    assert_eq!(status, StatusCode::OK);

    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["track_id"], "T1");
    assert_eq!(tracks[0]["artist_name"], "Artist One");
    assert_eq!(tracks[0]["album_name"], "Album One");
    assert_eq!(tracks[0]["album_art"], "https://img/64");
    assert_eq!(tracks[1]["duration"], 200);

    let calls_after_first = catalog.catalog_calls();

    let (status, second_body) = get(&app, "/artist/A1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second_body, body);
    assert_eq!(catalog.catalog_calls(), calls_after_first);
}

/// Scenario 2: two tracks with identical durations collapse to one record,
/// first occurrence wins.
#[tokio::test]
async fn duplicate_durations_deduplicated() {
    let catalog = Arc::new(MockCatalog::new().with_album(
        "A1",
        "AL1",
        "Album One",
        &[],
        vec![
            MockTrack::new("T1", 150, &[("A1", "Artist One")]),
            MockTrack::new("T2", 150, &[("A1", "Artist One")]),
        ],
    ));
    let (app, _store) = test_app(catalog).await;

    let (status, body) = get(&app, "/artist/A1").await;
    assert_eq!(status, StatusCode::OK);

    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["track_id"], "T1");
}

/// Tracks on a compilation album that do not credit the artist are dropped.
#[tokio::test]
async fn foreign_tracks_filtered_out() {
    let catalog = Arc::new(MockCatalog::new().with_album(
        "A1",
        "AL1",
        "Compilation",
        &[],
        vec![
            MockTrack::new("T1", 100, &[("A9", "Someone Else")]),
            MockTrack::new("T2", 200, &[("A1", "Artist One"), ("A9", "Someone Else")]),
        ],
    ));
    let (app, _store) = test_app(catalog).await;

    let (_, body) = get(&app, "/artist/A1").await;
    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["track_id"], "T2");
}

/// Scenario 3: feature backfill enriches only the matched record; the other
/// stays incomplete; a further call re-fetches only the incomplete one.
#[tokio::test]
async fn feature_backfill_is_partial_and_incremental() {
    let catalog = Arc::new(two_track_catalog().with_features(
        "T1",
        json!({"energy": 0.8, "tempo": 121.978, "danceability": 0.5}),
    ));
    let (app, _store) = test_app(catalog.clone()).await;

    // Prime the cache through the listing endpoint
    let (status, _) = get(&app, "/artist/A1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/artist/A1/audio-features").await;
    assert_eq!(status, StatusCode::OK);

    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);

    let t1 = tracks.iter().find(|t| t["track_id"] == "T1").unwrap();
    let t2 = tracks.iter().find(|t| t["track_id"] == "T2").unwrap();

    // Sanitized to decimal strings, flat beside the base fields
    assert_eq!(t1["energy"], "0.8");
    assert_eq!(t1["tempo"], "121.978");
    assert!(t2.get("energy").is_none());
    assert_eq!(t2["track_name"], "Track T2");

    // Third invocation: only the still-incomplete T2 is requested
    let (status, _) = get(&app, "/artist/A1/audio-features").await;
    assert_eq!(status, StatusCode::OK);

    let requests = catalog.feature_requests.lock().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], vec!["T1".to_string(), "T2".to_string()]);
    assert_eq!(requests[1], vec!["T2".to_string()]);
}

/// Once every record is feature-complete the enrichment endpoint stops
/// calling the catalog entirely.
#[tokio::test]
async fn complete_artist_skips_feature_lookup() {
    let catalog = Arc::new(
        two_track_catalog()
            .with_features("T1", json!({"energy": 0.8}))
            .with_features("T2", json!({"energy": 0.3})),
    );
    let (app, _store) = test_app(catalog.clone()).await;

    get(&app, "/artist/A1").await;
    get(&app, "/artist/A1/audio-features").await;
    let calls_after_backfill = catalog.feature_calls.load(Ordering::SeqCst);
    assert_eq!(calls_after_backfill, 1);

    let (status, body) = get(&app, "/artist/A1/audio-features").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracks"].as_array().unwrap().len(), 2);
    assert_eq!(catalog.feature_calls.load(Ordering::SeqCst), 1);
}

/// Scenario 4: the enrichment endpoint for a never-synced artist returns the
/// typed "not loaded" state and makes no catalog calls.
#[tokio::test]
async fn features_for_unsynced_artist() {
    let catalog = Arc::new(two_track_catalog());
    let (app, _store) = test_app(catalog.clone()).await;

    let (status, body) = get(&app, "/artist/A1/audio-features").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Artist not loaded");
    assert_eq!(catalog.catalog_calls(), 0);
    assert_eq!(catalog.feature_calls.load(Ordering::SeqCst), 0);
}

/// Scenario 5: a rejected artist id surfaces as a 400 naming the id, and
/// nothing is persisted.
#[tokio::test]
async fn invalid_artist_is_bad_request() {
    let catalog = Arc::new(two_track_catalog());
    let (app, store) = test_app(catalog).await;

    let (status, body) = get(&app, "/artist/nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid artist_id: nope");

    assert!(store.query_by_artist("nope").await.unwrap().is_none());
}

/// Health endpoint reports module identity.
#[tokio::test]
async fn health_check_responds() {
    let catalog = Arc::new(MockCatalog::new());
    let (app, _store) = test_app(catalog).await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tracktempo");
}
