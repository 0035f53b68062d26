//! Track record persistence
//!
//! Partition-keyed store adapter: all records for one artist live under the
//! `artist_id` partition, with `track_id` as the sort component of the
//! composite key. Writes are idempotent upserts.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use crate::models::TrackRecord;

/// Rows written per statement batch. Mirrors the upstream store's batch
/// writer flush size; callers never see the chunking.
const WRITE_BATCH_SIZE: usize = 25;

/// Store adapter for track records.
#[derive(Clone)]
pub struct TrackStore {
    pool: SqlitePool,
}

impl TrackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Query all records for one artist.
    ///
    /// Returns `None` when zero records exist for the partition key, so the
    /// orchestrator can distinguish "never synced" from "synced but empty".
    pub async fn query_by_artist(&self, artist_id: &str) -> Result<Option<Vec<TrackRecord>>> {
        let rows = sqlx::query(
            r#"
            SELECT artist_id, track_id, track_name, artist_name,
                   album_name, album_art, duration, features
            FROM tracks
            WHERE artist_id = ?
            ORDER BY track_id
            "#,
        )
        .bind(artist_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let features_json: Option<String> = row.get("features");
            let features: BTreeMap<String, String> = match features_json {
                Some(json) => serde_json::from_str(&json)
                    .context("corrupt features column for track record")?,
                None => BTreeMap::new(),
            };

            records.push(TrackRecord {
                artist_id: row.get("artist_id"),
                track_id: row.get("track_id"),
                track_name: row.get("track_name"),
                artist_name: row.get("artist_name"),
                album_name: row.get("album_name"),
                album_art: row.get("album_art"),
                duration: row.get("duration"),
                features,
            });
        }

        Ok(Some(records))
    }

    /// Upsert a batch of records, keyed by (artist_id, track_id).
    ///
    /// Used both for the initial save and the post-merge re-save. Chunks
    /// internally, one transaction per chunk.
    pub async fn write_batch(&self, records: &[TrackRecord]) -> Result<()> {
        for chunk in records.chunks(WRITE_BATCH_SIZE) {
            let mut tx = self.pool.begin().await?;

            for record in chunk {
                let features_json = if record.features.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&record.features)?)
                };

                sqlx::query(
                    r#"
                    INSERT INTO tracks (
                        artist_id, track_id, track_name, artist_name,
                        album_name, album_art, duration, features,
                        created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
                    ON CONFLICT(artist_id, track_id) DO UPDATE SET
                        track_name = excluded.track_name,
                        artist_name = excluded.artist_name,
                        album_name = excluded.album_name,
                        album_art = excluded.album_art,
                        duration = excluded.duration,
                        features = excluded.features,
                        updated_at = CURRENT_TIMESTAMP
                    "#,
                )
                .bind(&record.artist_id)
                .bind(&record.track_id)
                .bind(&record.track_name)
                .bind(&record.artist_name)
                .bind(&record.album_name)
                .bind(&record.album_art)
                .bind(record.duration)
                .bind(features_json)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
        }

        tracing::debug!(count = records.len(), "Track batch written");

        Ok(())
    }
}
