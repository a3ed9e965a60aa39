//! Normalization of raw export records into canonical events.

use super::models::{CalendarFields, MusicEvent, PlaybackInfo, PodcastEvent, StreamEvent};
use super::raw::{ExportDocument, HistoryError, RawStreamRecord};
use crate::catalog::TrackId;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Counters collected while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub documents: usize,
    pub records: usize,
    pub music: usize,
    pub podcasts: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedHistory {
    pub events: Vec<StreamEvent>,
    pub report: NormalizeReport,
}

/// Converts milliseconds to whole seconds, rounding half up.
pub fn ms_to_secs(ms: i64) -> i64 {
    ms.max(0).saturating_add(500) / 1000
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_record(record: RawStreamRecord) -> Result<StreamEvent, String> {
    let ts = record.ts.ok_or("missing timestamp")?;
    let timestamp = parse_timestamp(&ts).ok_or_else(|| format!("invalid timestamp '{}'", ts))?;

    let playback = PlaybackInfo {
        calendar: CalendarFields::from_timestamp(&timestamp),
        timestamp,
        duration_secs: record.duration_ms.map(ms_to_secs),
        played_secs: ms_to_secs(record.ms_played.unwrap_or(0)),
        reason_start: record.reason_start,
        reason_end: record.reason_end,
        shuffle: record.shuffle,
    };

    if let Some(id) = record.spotify_track_uri.as_deref().and_then(TrackId::parse) {
        return Ok(StreamEvent::Music(MusicEvent {
            id,
            artist: record.master_metadata_album_artist_name.unwrap_or_default(),
            track: record.master_metadata_track_name.unwrap_or_default(),
            album: record.master_metadata_album_album_name.unwrap_or_default(),
            playback,
        }));
    }

    if let Some(episode) = non_empty(record.episode_name) {
        return Ok(StreamEvent::Podcast(PodcastEvent {
            episode,
            show: record.episode_show_name,
            episode_uri: record.spotify_episode_uri,
            playback,
        }));
    }

    Err("neither a track nor an episode".to_string())
}

/// Builds the canonical event table from export documents.
///
/// Documents are concatenated and the result is ordered by start timestamp,
/// so the order documents are supplied in does not matter. Records that can
/// not be classified are skipped and counted in the report.
pub fn normalize(documents: Vec<ExportDocument>) -> Result<NormalizedHistory, HistoryError> {
    if documents.is_empty() {
        return Err(HistoryError::MissingData("no export documents".to_string()));
    }

    let mut report = NormalizeReport {
        documents: documents.len(),
        ..Default::default()
    };
    let mut events = Vec::new();

    for document in documents {
        for (index, record) in document.records.into_iter().enumerate() {
            report.records += 1;
            match normalize_record(record) {
                Ok(event) => {
                    if event.is_podcast() {
                        report.podcasts += 1;
                    } else {
                        report.music += 1;
                    }
                    events.push(event);
                }
                Err(reason) => {
                    debug!("Skipping record {} of {}: {}", index, document.source, reason);
                    report.skipped += 1;
                }
            }
        }
    }

    events.sort_by_key(|e| e.playback().timestamp);

    if report.skipped > 0 {
        warn!(
            "Skipped {} of {} history records that could not be normalized",
            report.skipped, report.records
        );
    }
    info!(
        "Normalized {} events: {} music, {} podcast",
        events.len(),
        report.music,
        report.podcasts
    );

    Ok(NormalizedHistory { events, report })
}

/// Podcast episodes only.
pub fn get_podcasts(events: &[StreamEvent]) -> Vec<PodcastEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Podcast(p) => Some(p.clone()),
            StreamEvent::Music(_) => None,
        })
        .collect()
}

/// Music plays only.
pub fn remove_podcasts(events: &[StreamEvent]) -> Vec<MusicEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Music(m) => Some(m.clone()),
            StreamEvent::Podcast(_) => None,
        })
        .collect()
}

/// Splits events into music plays and podcast episodes in one pass.
pub fn partition(events: Vec<StreamEvent>) -> (Vec<MusicEvent>, Vec<PodcastEvent>) {
    let mut music = Vec::new();
    let mut podcasts = Vec::new();
    for event in events {
        match event {
            StreamEvent::Music(m) => music.push(m),
            StreamEvent::Podcast(p) => podcasts.push(p),
        }
    }
    (music, podcasts)
}
