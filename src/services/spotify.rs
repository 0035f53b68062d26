//! Spotify Web API client
//!
//! Implements [`CatalogClient`] against the Spotify Web API: client
//! credentials token flow, cursor pagination with a safety cap, batched
//! detail/feature lookups, minimum-interval rate limiting, and retry with
//! exponential backoff for transient transport errors (connect failures,
//! 429, 5xx). Non-transient 4xx responses are never retried.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::catalog::{
    Album, AlbumDetail, AudioFeatures, CatalogClient, CatalogError, Page, RawTrack, TrackItem,
    ALBUM_BATCH_LIMIT, FEATURE_BATCH_LIMIT,
};

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = "tracktempo/0.1.0";
const RATE_LIMIT_MS: u64 = 100;
const LISTING_PAGE_SIZE: u32 = 50;

/// Safety cap on cursor-following; a real catalog never comes close.
const MAX_PAGES: u32 = 200;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 250;

/// Tokens are refreshed this long before their reported expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

/// Spotify credentials resolved at startup.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Parse a Retry-After header value (seconds form only).
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[derive(Debug, Deserialize)]
struct AlbumsEnvelope {
    albums: Vec<AlbumDetail>,
}

#[derive(Debug, Deserialize)]
struct FeaturesEnvelope {
    audio_features: Vec<Option<AudioFeatures>>,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: Arc<RateLimiter>,
    api_base: String,
    token_url: String,
    max_pages: u32,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials) -> Result<Self, CatalogError> {
        Self::with_endpoints(
            credentials,
            API_BASE_URL.to_string(),
            TOKEN_URL.to_string(),
            MAX_PAGES,
        )
    }

    /// Construct against explicit endpoints and page cap. Production goes
    /// through [`SpotifyClient::new`]; tests point this at a local server.
    fn with_endpoints(
        credentials: SpotifyCredentials,
        api_base: String,
        token_url: String,
        max_pages: u32,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            token: Mutex::new(None),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            api_base,
            token_url,
            max_pages,
        })
    }

    /// Get a valid access token, requesting a fresh one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        tracing::debug!("Requesting client-credentials token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "token request failed with {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        let ttl = token
            .expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .max(1);

        tracing::info!(expires_in = token.expires_in, "Access token acquired");

        let cached_token = CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };
        let access_token = cached_token.access_token.clone();
        *cached = Some(cached_token);

        Ok(access_token)
    }

    /// Drop the cached token so the next request re-authenticates.
    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// GET a JSON resource, retrying transient failures with exponential
    /// backoff. 429 honors Retry-After when the header parses as seconds.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let mut backoff_ms = RETRY_BASE_DELAY_MS;

        for attempt in 1..=RETRY_ATTEMPTS {
            self.rate_limiter.wait().await;
            let token = self.access_token().await?;

            tracing::debug!(url, attempt, "Querying Spotify API");

            let result = self
                .http_client
                .get(url)
                .bearer_auth(&token)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    if attempt == RETRY_ATTEMPTS {
                        return Err(CatalogError::Network(e.to_string()));
                    }
                    tracing::warn!(
                        url,
                        attempt,
                        backoff_ms,
                        error = %e,
                        "Transport error, will retry after backoff"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 401 {
                // Token expired server-side; re-authenticate and retry
                self.invalidate_token().await;
                if attempt == RETRY_ATTEMPTS {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(CatalogError::Auth(error_text));
                }
                continue;
            }

            if status.as_u16() == 429 || status.is_server_error() {
                if attempt == RETRY_ATTEMPTS {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(CatalogError::Api(status.as_u16(), error_text));
                }
                let delay = parse_retry_after(&response)
                    .unwrap_or(Duration::from_millis(backoff_ms));
                tracing::warn!(
                    url,
                    attempt,
                    status = status.as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "Transient API error, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
                backoff_ms *= 2;
                continue;
            }

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(CatalogError::Api(status.as_u16(), error_text));
            }

            return response
                .json()
                .await
                .map_err(|e| CatalogError::Parse(e.to_string()));
        }

        unreachable!("retry loop always returns")
    }

    /// Follow pagination cursors until exhausted, accumulating all items.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        first_url: String,
        listing: &'static str,
    ) -> Result<Vec<T>, CatalogError> {
        let mut items = Vec::new();
        let mut next = Some(first_url);
        let mut pages = 0u32;

        while let Some(url) = next {
            pages += 1;
            if pages > self.max_pages {
                return Err(CatalogError::PageLimitExceeded(listing, self.max_pages));
            }
            let page: Page<T> = self.get_json(&url).await?;
            items.extend(page.items);
            next = page.next;
        }

        tracing::debug!(listing, pages, items = items.len(), "Listing complete");

        Ok(items)
    }
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn list_albums(&self, artist_id: &str) -> Result<Vec<Album>, CatalogError> {
        let url = format!(
            "{}/artists/{}/albums?market=US&limit={}",
            self.api_base, artist_id, LISTING_PAGE_SIZE
        );

        self.collect_pages(url, "album").await.map_err(|e| match e {
            // A rejected identifier surfaces as a client-facing bad request
            CatalogError::Api(400, _) | CatalogError::Api(404, _) => {
                CatalogError::InvalidArtist(artist_id.to_string())
            }
            other => other,
        })
    }

    async fn fetch_album_details(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumDetail>, CatalogError> {
        let mut details = Vec::with_capacity(album_ids.len());

        for batch in album_ids.chunks(ALBUM_BATCH_LIMIT) {
            let url = format!("{}/albums?ids={}", self.api_base, batch.join(","));
            let envelope: AlbumsEnvelope = self.get_json(&url).await?;
            details.extend(envelope.albums);
        }

        Ok(details)
    }

    async fn list_tracks(&self, album: &AlbumDetail) -> Result<Vec<RawTrack>, CatalogError> {
        let url = format!(
            "{}/albums/{}/tracks?limit={}",
            self.api_base, album.id, LISTING_PAGE_SIZE
        );

        let items: Vec<TrackItem> = self.collect_pages(url, "track").await?;

        Ok(items
            .into_iter()
            .map(|item| RawTrack::from_item(item, album))
            .collect())
    }

    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        let mut features = Vec::with_capacity(track_ids.len());

        for batch in track_ids.chunks(FEATURE_BATCH_LIMIT) {
            let url = format!("{}/audio-features?ids={}", self.api_base, batch.join(","));
            let envelope: FeaturesEnvelope = self.get_json(&url).await?;
            features.extend(envelope.audio_features);
        }

        Ok(features)
    }
}
