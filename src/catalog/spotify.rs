//! Spotify Web API client.
//!
//! Speaks the two endpoints the pipeline needs: playlist track listing and
//! batched audio features. Access tokens come either from configuration or
//! from the client credentials flow and are refreshed shortly before expiry.

use super::client::CatalogClient;
use super::error::CatalogError;
use super::models::{AudioFeatures, PlaylistPage, PlaylistTrack, TrackId};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

const PLAYLIST_URI_PREFIX: &str = "spotify:playlist:";
const PLAYLIST_URL_MARKER: &str = "/playlist/";
const PLAYLIST_FIELDS: &str = "items(track(id,name,artists(name),album(name))),total";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How the client obtains access tokens.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A pre-issued bearer token, used as is.
    Token(String),
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    /// Whether a new token can be requested when the current one is rejected.
    pub fn can_refresh(&self) -> bool {
        matches!(self, Credentials::ClientCredentials { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    pub api_base_url: String,
    pub auth_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
}

impl SpotifyClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            api_base_url: SPOTIFY_API_BASE.to_string(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            credentials,
            timeout: Duration::from_secs(30),
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => now + TOKEN_REFRESH_MARGIN < expires_at,
            None => true,
        }
    }
}

pub struct SpotifyClient {
    client: Client,
    api_base_url: String,
    auth_url: String,
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct PlaylistTracksResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    total: Option<usize>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Vec<SpotifyName>,
    album: Option<SpotifyName>,
}

#[derive(Deserialize)]
struct SpotifyName {
    name: Option<String>,
}

#[derive(Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<AudioFeatures>>,
}

/// Extracts the bare playlist id from an id, a `spotify:playlist:` URI or an
/// `open.spotify.com` link.
pub fn playlist_id_from(value: &str) -> &str {
    let value = value.trim();
    if let Some(id) = value.strip_prefix(PLAYLIST_URI_PREFIX) {
        return id;
    }
    if let Some(pos) = value.find(PLAYLIST_URL_MARKER) {
        let rest = &value[pos + PLAYLIST_URL_MARKER.len()..];
        return rest.split(['?', '/', '#']).next().unwrap_or(rest);
    }
    value
}

fn page_from_response(response: PlaylistTracksResponse) -> PlaylistPage {
    let item_count = response.items.len();
    let tracks = response
        .items
        .into_iter()
        .filter_map(|item| {
            let track = item.track?;
            // Local files and removed tracks have no catalog id.
            let id = TrackId::parse(track.id.as_deref()?)?;
            let artist = track
                .artists
                .into_iter()
                .next()
                .and_then(|a| a.name)
                .unwrap_or_default();
            Some(PlaylistTrack {
                artist,
                track: track.name.unwrap_or_default(),
                album: track.album.and_then(|a| a.name).unwrap_or_default(),
                id,
            })
        })
        .collect();

    PlaylistPage {
        tracks,
        item_count,
        total: response.total,
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Maps non-success statuses to catalog errors.
fn check_status(response: Response, what: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(CatalogError::RateLimited(retry_after(&response))),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Auth(format!(
            "{} returned {}",
            what, status
        ))),
        StatusCode::NOT_FOUND => Err(CatalogError::NotFound(what.to_string())),
        _ => Err(CatalogError::Api {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        }),
    }
}

impl SpotifyClient {
    pub fn new(config: SpotifyClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_http_client(config, client))
    }

    fn with_http_client(config: SpotifyClientConfig, client: Client) -> Self {
        Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url,
            credentials: config.credentials,
            token: Mutex::new(None),
        }
    }

    fn request_token(&self) -> Result<AccessToken, CatalogError> {
        match &self.credentials {
            Credentials::Token(value) => Ok(AccessToken {
                value: value.clone(),
                expires_at: None,
            }),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => {
                debug!("Requesting catalog access token");
                let response = self
                    .client
                    .post(&self.auth_url)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()?;
                let body: TokenResponse = check_status(response, "token request")?.json()?;
                info!("Obtained catalog access token");
                Ok(AccessToken {
                    value: body.access_token,
                    expires_at: body
                        .expires_in
                        .map(|secs| Instant::now() + Duration::from_secs(secs)),
                })
            }
        }
    }

    fn access_token(&self) -> Result<String, CatalogError> {
        let mut token = self.token.lock().unwrap();
        if let Some(current) = token.as_ref() {
            if current.is_fresh(Instant::now()) {
                return Ok(current.value.clone());
            }
        }
        let fresh = self.request_token()?;
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    fn send_get(&self, url: &str) -> Result<Response, CatalogError> {
        let token = self.access_token()?;
        Ok(self.client.get(url).bearer_auth(token).send()?)
    }

    /// Authorized GET. A rejected token obtained through client credentials
    /// is dropped and the request is repeated once with a new one.
    fn get(&self, url: &str, what: &str) -> Result<Response, CatalogError> {
        let response = self.send_get(url)?;
        if response.status() == StatusCode::UNAUTHORIZED && self.credentials.can_refresh() {
            info!("Catalog rejected the access token, re-authenticating");
            *self.token.lock().unwrap() = None;
            return check_status(self.send_get(url)?, what);
        }
        check_status(response, what)
    }
}

impl CatalogClient for SpotifyClient {
    fn playlist_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistPage, CatalogError> {
        let id = playlist_id_from(playlist_id);
        let url = format!(
            "{}/playlists/{}/tracks?offset={}&limit={}&fields={}",
            self.api_base_url,
            urlencoding::encode(id),
            offset,
            limit,
            urlencoding::encode(PLAYLIST_FIELDS)
        );
        let body: PlaylistTracksResponse = self.get(&url, "playlist")?.json()?;
        Ok(page_from_response(body))
    }

    fn audio_features(&self, ids: &[TrackId]) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        let joined = ids
            .iter()
            .map(|id| urlencoding::encode(id.as_str()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/audio-features?ids={}", self.api_base_url, joined);
        let body: AudioFeaturesResponse = self.get(&url, "audio features")?.json()?;
        Ok(body.audio_features)
    }
}
