//! Access to the remote music catalog.

mod adapter;
mod client;
mod error;
mod models;
mod rate_limit;
mod retry_policy;
mod spotify;

pub use adapter::CatalogAdapter;
pub use client::{CatalogClient, AUDIO_FEATURES_BATCH_LIMIT, PLAYLIST_PAGE_LIMIT};
pub use error::CatalogError;
pub use models::{AudioFeatures, PlaylistPage, PlaylistTrack, TrackId};
pub use rate_limit::{RateLimitConfig, SlidingWindowLimiter};
pub use retry_policy::RetryPolicy;
pub use spotify::{
    playlist_id_from, Credentials, SpotifyClient, SpotifyClientConfig, SPOTIFY_API_BASE,
    SPOTIFY_AUTH_URL,
};
