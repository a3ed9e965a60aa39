use crate::catalog::{AudioFeatures, PlaylistTrack, TrackId};
use crate::history::{ms_to_secs, MusicEvent};
use crate::wheel::{KeySignature, WheelPosition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio features of a track after key conversion and tempo rounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFeatures {
    /// Beats per minute, rounded half away from zero.
    pub tempo: i64,
    pub duration_ms: i64,
    pub key_signature: KeySignature,
    /// `None` when the catalog detected no key.
    pub camelot: Option<WheelPosition>,
}

impl TrackFeatures {
    pub fn new(features: &AudioFeatures, camelot: Option<WheelPosition>) -> Self {
        Self {
            tempo: features.tempo.round() as i64,
            duration_ms: features.duration_ms,
            key_signature: KeySignature::from_catalog(features.key, features.mode),
            camelot,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        ms_to_secs(self.duration_ms)
    }
}

/// A music play joined with the features of its track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedStream {
    pub event: MusicEvent,
    pub features: TrackFeatures,
}

impl EnrichedStream {
    /// Share of the track that was played, if its length is known.
    pub fn played_ratio(&self) -> Option<f64> {
        let duration = self
            .event
            .playback
            .duration_secs
            .unwrap_or_else(|| self.features.duration_secs());
        if duration <= 0 {
            return None;
        }
        Some(self.event.playback.played_secs as f64 / duration as f64)
    }
}

/// A playlist entry joined with the features of its track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPlaylistTrack {
    pub artist: String,
    pub track: String,
    pub album: String,
    pub tempo: i64,
    pub camelot: Option<WheelPosition>,
    pub key_signature: KeySignature,
    pub id: TrackId,
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    artist: &str,
    track: &str,
    tempo: i64,
    camelot: Option<&WheelPosition>,
    key_signature: &KeySignature,
) -> fmt::Result {
    let camelot = camelot.map(|c| c.as_str()).unwrap_or("-");
    write!(
        f,
        "{} - {} [{} BPM, {}, {}]",
        artist, track, tempo, camelot, key_signature
    )
}

impl fmt::Display for EnrichedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_row(
            f,
            &self.event.artist,
            &self.event.track,
            self.features.tempo,
            self.features.camelot.as_ref(),
            &self.features.key_signature,
        )
    }
}

impl fmt::Display for EnrichedPlaylistTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_row(
            f,
            &self.artist,
            &self.track,
            self.tempo,
            self.camelot.as_ref(),
            &self.key_signature,
        )
    }
}

/// A row that can be joined with track features.
pub trait Enrichable {
    type Output;

    fn track_id(&self) -> &TrackId;

    fn enrich(&self, features: &TrackFeatures) -> Self::Output;
}

impl Enrichable for MusicEvent {
    type Output = EnrichedStream;

    fn track_id(&self) -> &TrackId {
        &self.id
    }

    fn enrich(&self, features: &TrackFeatures) -> EnrichedStream {
        EnrichedStream {
            event: self.clone(),
            features: features.clone(),
        }
    }
}

impl Enrichable for EnrichedStream {
    type Output = EnrichedStream;

    fn track_id(&self) -> &TrackId {
        &self.event.id
    }

    fn enrich(&self, features: &TrackFeatures) -> EnrichedStream {
        self.event.enrich(features)
    }
}

impl Enrichable for PlaylistTrack {
    type Output = EnrichedPlaylistTrack;

    fn track_id(&self) -> &TrackId {
        &self.id
    }

    fn enrich(&self, features: &TrackFeatures) -> EnrichedPlaylistTrack {
        EnrichedPlaylistTrack {
            artist: self.artist.clone(),
            track: self.track.clone(),
            album: self.album.clone(),
            tempo: features.tempo,
            camelot: features.camelot.clone(),
            key_signature: features.key_signature,
            id: self.id.clone(),
        }
    }
}

impl Enrichable for EnrichedPlaylistTrack {
    type Output = EnrichedPlaylistTrack;

    fn track_id(&self) -> &TrackId {
        &self.id
    }

    fn enrich(&self, features: &TrackFeatures) -> EnrichedPlaylistTrack {
        EnrichedPlaylistTrack {
            tempo: features.tempo,
            camelot: features.camelot.clone(),
            key_signature: features.key_signature,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(tempo: f64, key: i32, mode: i32) -> AudioFeatures {
        AudioFeatures {
            id: TrackId::parse("x").unwrap(),
            tempo,
            duration_ms: 200_000,
            key,
            mode,
        }
    }

    #[test]
    fn test_tempo_rounds_half_away_from_zero() {
        assert_eq!(TrackFeatures::new(&features(120.5, 0, 1), None).tempo, 121);
        assert_eq!(TrackFeatures::new(&features(120.49, 0, 1), None).tempo, 120);
        assert_eq!(TrackFeatures::new(&features(79.5, 0, 1), None).tempo, 80);
    }

    #[test]
    fn test_key_signature_from_raw_values() {
        let f = TrackFeatures::new(&features(100.0, 9, 0), None);
        assert_eq!(f.key_signature.to_string(), "A minor");

        let f = TrackFeatures::new(&features(100.0, -1, 1), None);
        assert!(!f.key_signature.is_detected());
        assert_eq!(f.camelot, None);
    }

    #[test]
    fn test_enriched_playlist_track_re_enrich_keeps_metadata() {
        let track = PlaylistTrack {
            artist: "A".into(),
            track: "T".into(),
            album: "L".into(),
            id: TrackId::parse("x").unwrap(),
        };
        let first = track.enrich(&TrackFeatures::new(
            &features(100.0, 0, 1),
            Some(WheelPosition::new("8B")),
        ));
        let second = first.enrich(&TrackFeatures::new(
            &features(128.2, 7, 1),
            Some(WheelPosition::new("9B")),
        ));

        assert_eq!(second.artist, "A");
        assert_eq!(second.tempo, 128);
        assert_eq!(second.camelot, Some(WheelPosition::new("9B")));
        assert_eq!(second.key_signature.to_string(), "G major");
        assert_eq!(second.to_string(), "A - T [128 BPM, 9B, G major]");
    }
}
