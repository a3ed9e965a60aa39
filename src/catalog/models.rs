//! Data returned by the catalog service.

use serde::{Deserialize, Serialize};
use std::fmt;

const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Catalog identifier of a track, always stored in its bare form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Accepts either a bare id or a `spotify:track:` URI.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let id = value.strip_prefix(TRACK_URI_PREFIX).unwrap_or(value);
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio analysis values for a single track.
///
/// `key` is a pitch class (0-11, -1 when undetected), `mode` is 1 for major
/// and 0 for minor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: TrackId,
    pub tempo: f64,
    pub duration_ms: i64,
    pub key: i32,
    pub mode: i32,
}

/// Minimal track schema returned by playlist enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub artist: String,
    pub track: String,
    pub album: String,
    pub id: TrackId,
}

/// One page of a playlist listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub tracks: Vec<PlaylistTrack>,
    /// Number of items the page contained, including entries without a
    /// usable track (local files, removed tracks). Drives the offset cursor.
    pub item_count: usize,
    pub total: Option<usize>,
}
