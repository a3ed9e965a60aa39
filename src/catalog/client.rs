use super::error::CatalogError;
use super::models::{AudioFeatures, PlaylistPage, TrackId};

/// Upper bound on ids per audio features request.
pub const AUDIO_FEATURES_BATCH_LIMIT: usize = 50;

/// Upper bound on items per playlist page.
pub const PLAYLIST_PAGE_LIMIT: usize = 100;

/// Boundary to the remote music catalog.
///
/// Implementations perform exactly one remote call per method invocation.
/// Pacing and retries are layered on top by [`super::CatalogAdapter`].
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of a playlist starting at `offset`.
    fn playlist_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistPage, CatalogError>;

    /// Fetch audio features for up to [`AUDIO_FEATURES_BATCH_LIMIT`] ids.
    ///
    /// The result is positionally aligned with `ids`; `None` marks an id
    /// the catalog has no features for.
    fn audio_features(&self, ids: &[TrackId]) -> Result<Vec<Option<AudioFeatures>>, CatalogError>;
}
