//! Spotify Web API client and mirror download
//!
//! Track metadata comes from the official Web API using the client-credentials
//! flow. The audio itself is resolved through a mirror service that returns a
//! direct link for a track URL.

use crate::error::{DownloadError, DownloadResult};
use crate::progress::{Progress, ProgressSender};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const TRACK_API_URL: &str = "https://api.spotify.com/v1/tracks/";

/// Tokens are refreshed this long before Spotify says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Client-credentials pair for the Spotify Web API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Track metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    pub artists: Vec<Artist>,
    pub duration_ms: u64,
    pub album: Album,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

impl Track {
    /// Comma-separated artist names
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Largest album cover, if any
    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct MirrorResponse {
    status: bool,
    data: Option<MirrorData>,
}

#[derive(Debug, Deserialize)]
struct MirrorData {
    link: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(value: String, expires_in: Duration, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Spotify metadata + mirror download client
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: SpotifyCredentials,
    mirror_api: String,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, credentials: SpotifyCredentials, mirror_api: impl Into<String>) -> Self {
        Self {
            http,
            credentials,
            mirror_api: mirror_api.into(),
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Fetch (or reuse) an access token
    pub async fn access_token(&self) -> DownloadResult<String> {
        let mut cached = self.token.lock().await;
        let now = Instant::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        tracing::debug!("Requesting Spotify access token");
        let response: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let token = CachedToken::new(
            response.access_token,
            Duration::from_secs(response.expires_in),
            now,
        );
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Fetch track metadata by id
    pub async fn track(&self, track_id: &str) -> DownloadResult<Track> {
        let token = self.access_token().await?;
        tracing::info!("Fetching Spotify track {}", track_id);

        let track = self
            .http
            .get(format!("{}{}", TRACK_API_URL, track_id))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(track)
    }

    /// Ask the mirror service for a direct audio link
    ///
    /// Returns `Ok(None)` when the mirror rejects the URL.
    pub async fn resolve_audio_link(&self, track_url: &str) -> DownloadResult<Option<String>> {
        let api_url = mirror_request_url(&self.mirror_api, track_url);
        let response = self.http.get(&api_url).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::Api(format!(
                "download API answered {}",
                response.status()
            )));
        }

        let body: MirrorResponse = response.json().await?;
        Ok(parse_mirror_response(body))
    }

    /// Stream `url` into `dest`, refusing bodies larger than `limit` bytes
    pub async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        limit: u64,
        progress: Option<&ProgressSender>,
    ) -> DownloadResult<u64> {
        let mut response = self.http.get(url).send().await?.error_for_status()?;
        let total = response.content_length();

        if let Some(size) = total.filter(|size| *size > limit) {
            return Err(DownloadError::TooLarge { size, limit });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let started = Instant::now();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            downloaded += chunk.len() as u64;
            if downloaded > limit {
                return Err(DownloadError::TooLarge {
                    size: downloaded,
                    limit,
                });
            }
            file.write_all(&chunk).await?;

            if let Some(tx) = progress {
                let elapsed = started.elapsed().as_secs_f64();
                let _ = tx.send(Some(Progress {
                    downloaded,
                    total,
                    speed: (elapsed > 0.0).then(|| downloaded as f64 / elapsed),
                }));
            }
        }

        file.flush().await?;
        tracing::debug!("Fetched {} bytes into {}", downloaded, dest.display());
        Ok(downloaded)
    }
}

fn mirror_request_url(api: &str, track_url: &str) -> String {
    format!("{}?url={}", api, urlencoding::encode(track_url))
}

fn parse_mirror_response(body: MirrorResponse) -> Option<String> {
    if !body.status {
        return None;
    }
    body.data.map(|d| d.link).filter(|link| !link.is_empty())
}
