//! In-process catalog that records every call.

use super::constants::*;
use harmonic_history::catalog::{
    AudioFeatures, CatalogAdapter, CatalogClient, CatalogError, PlaylistPage, PlaylistTrack,
    RetryPolicy, SlidingWindowLimiter, TrackId,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct FakeCatalog {
    playlists: HashMap<String, Vec<PlaylistTrack>>,
    features: HashMap<TrackId, AudioFeatures>,
    /// (playlist, offset, limit) of every page request.
    pub page_calls: Mutex<Vec<(String, usize, usize)>>,
    /// Ids of every feature request.
    pub feature_calls: Mutex<Vec<Vec<TrackId>>>,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            playlists: HashMap::new(),
            features: HashMap::new(),
            page_calls: Mutex::new(Vec::new()),
            feature_calls: Mutex::new(Vec::new()),
        }
    }

    /// Catalog knowing the fixture tracks and a playlist made of them.
    pub fn with_known_tracks() -> Self {
        let known = [
            (TRACK_C_MAJOR, 80.2, 0, 1),
            (TRACK_DOUBLE_TIME, 158.0, 0, 1),
            (TRACK_FAR_TEMPO, 120.0, 0, 1),
            (TRACK_A_MINOR, 84.6, 9, 0),
            (TRACK_NO_KEY, 80.0, -1, 1),
        ];
        let mut catalog = Self::new();
        for (id, tempo, key, mode) in known {
            catalog = catalog.with_features(id, tempo, key, mode);
        }

        let playlist = [
            ("Artist C", "Major Song", TRACK_C_MAJOR),
            ("Artist A", "Minor Song", TRACK_A_MINOR),
            ("Artist D", "Double Song", TRACK_DOUBLE_TIME),
            ("Artist X", "Unknown Song", TRACK_WITHOUT_FEATURES),
        ]
        .iter()
        .map(|(artist, track, id)| PlaylistTrack {
            artist: artist.to_string(),
            track: track.to_string(),
            album: format!("{} album", track),
            id: TrackId::parse(id).unwrap(),
        })
        .collect();
        catalog.with_playlist(PLAYLIST_ID, playlist)
    }

    pub fn with_features(mut self, id: &str, tempo: f64, key: i32, mode: i32) -> Self {
        let id = TrackId::parse(id).unwrap();
        self.features.insert(
            id.clone(),
            AudioFeatures {
                id,
                tempo,
                duration_ms: TRACK_DURATION_MS,
                key,
                mode,
            },
        );
        self
    }

    pub fn with_playlist(mut self, playlist_id: &str, tracks: Vec<PlaylistTrack>) -> Self {
        self.playlists.insert(playlist_id.to_string(), tracks);
        self
    }

    pub fn page_offsets(&self) -> Vec<usize> {
        self.page_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, offset, _)| *offset)
            .collect()
    }

    pub fn feature_batch_sizes(&self) -> Vec<usize> {
        self.feature_calls
            .lock()
            .unwrap()
            .iter()
            .map(|ids| ids.len())
            .collect()
    }
}

impl CatalogClient for FakeCatalog {
    fn playlist_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistPage, CatalogError> {
        self.page_calls
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), offset, limit));

        let playlist = self
            .playlists
            .get(playlist_id)
            .ok_or_else(|| CatalogError::NotFound(playlist_id.to_string()))?;
        let tracks: Vec<PlaylistTrack> =
            playlist.iter().skip(offset).take(limit).cloned().collect();
        Ok(PlaylistPage {
            item_count: tracks.len(),
            tracks,
            total: Some(playlist.len()),
        })
    }

    fn audio_features(&self, ids: &[TrackId]) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        self.feature_calls.lock().unwrap().push(ids.to_vec());
        Ok(ids.iter().map(|id| self.features.get(id).cloned()).collect())
    }
}

/// Adapter with default pacing and no retries.
#[allow(dead_code)]
pub fn fake_adapter(catalog: FakeCatalog) -> CatalogAdapter<FakeCatalog> {
    CatalogAdapter::new(
        catalog,
        SlidingWindowLimiter::with_defaults(),
        RetryPolicy::none(),
    )
}
