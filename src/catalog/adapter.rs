//! Paced, retrying access to the catalog.

use super::client::{CatalogClient, AUDIO_FEATURES_BATCH_LIMIT, PLAYLIST_PAGE_LIMIT};
use super::error::CatalogError;
use super::models::{AudioFeatures, PlaylistTrack, TrackId};
use super::rate_limit::SlidingWindowLimiter;
use super::retry_policy::RetryPolicy;
use super::spotify::playlist_id_from;
use tracing::{debug, info, warn};

/// Wraps a [`CatalogClient`] with pagination, rate limiting and retries.
pub struct CatalogAdapter<C> {
    client: C,
    limiter: SlidingWindowLimiter,
    retry_policy: RetryPolicy,
    page_size: usize,
}

impl<C: CatalogClient> CatalogAdapter<C> {
    pub fn new(client: C, limiter: SlidingWindowLimiter, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry_policy,
            page_size: PLAYLIST_PAGE_LIMIT,
        }
    }

    /// Page size used for playlist enumeration, clamped to `1..=100`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, PLAYLIST_PAGE_LIMIT);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    /// Runs `call` until it succeeds or fails permanently.
    ///
    /// Rate limited attempts always wait and are repeated; they do not count
    /// against `max_retries`.
    fn with_retry<T>(
        &self,
        what: &str,
        mut call: impl FnMut() -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let mut retry_count = 0;
        let mut rate_limited_count = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e @ CatalogError::RateLimited(_)) => {
                    let delay = self.retry_policy.delay_for(&e, rate_limited_count);
                    warn!("{} rate limited, waiting {:?}", what, delay);
                    std::thread::sleep(delay);
                    rate_limited_count = rate_limited_count.saturating_add(1);
                }
                Err(e) if self.retry_policy.should_retry(&e, retry_count) => {
                    let delay = self.retry_policy.delay_for(&e, retry_count);
                    warn!(
                        "{} failed (attempt {}): {}. Retrying in {:?}",
                        what,
                        retry_count + 1,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Enumerates every track of a playlist.
    ///
    /// The offset advances by the number of items each page returned and
    /// enumeration stops at the first empty page. `playlist` may be a bare id,
    /// a URI or a link.
    pub fn fetch_playlist(&self, playlist: &str) -> Result<Vec<PlaylistTrack>, CatalogError> {
        let playlist_id = playlist_id_from(playlist);
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.with_retry("Playlist page request", || {
                self.client.playlist_page(playlist_id, offset, self.page_size)
            })?;
            if page.item_count == 0 {
                break;
            }
            offset += page.item_count;
            debug!(
                "Playlist {}: fetched {} items (total {:?})",
                playlist_id, offset, page.total
            );
            tracks.extend(page.tracks);
        }

        info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    /// Fetches audio features for one batch of at most 50 ids.
    ///
    /// Every call passes through the rate limiter. Ids without features are
    /// dropped from the result.
    pub fn fetch_audio_features(&self, ids: &[TrackId]) -> Result<Vec<AudioFeatures>, CatalogError> {
        if ids.len() > AUDIO_FEATURES_BATCH_LIMIT {
            return Err(CatalogError::BatchTooLarge {
                size: ids.len(),
                limit: AUDIO_FEATURES_BATCH_LIMIT,
            });
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.with_retry("Audio features request", || {
            self.limiter.acquire();
            self.client.audio_features(ids)
        })?;

        let requested = response.len();
        let features: Vec<AudioFeatures> = response.into_iter().flatten().collect();
        if features.len() < requested {
            debug!(
                "{} of {} ids have no audio features",
                requested - features.len(),
                requested
            );
        }
        Ok(features)
    }
}
