//! Feature merge: joins rows with catalog audio features.

mod merge;
mod models;

pub use merge::{merge, non_skipped, EnrichmentError, MergeOptions, NO_SKIP_RATIO};
pub use models::{EnrichedPlaylistTrack, EnrichedStream, Enrichable, TrackFeatures};
