//! Canonical listening events.

use crate::catalog::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar fields derived from the start timestamp, kept as strings for
/// grouping downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFields {
    /// `%m/%d/%Y`
    pub date: String,
    /// `%H:%M:%S`
    pub time: String,
    /// Abbreviated month name, e.g. "Mar".
    pub month: String,
    /// Four-digit year.
    pub year: String,
    /// Abbreviated weekday name, e.g. "Tue".
    pub weekday: String,
}

impl CalendarFields {
    pub fn from_timestamp(timestamp: &DateTime<Utc>) -> Self {
        Self {
            date: timestamp.format("%m/%d/%Y").to_string(),
            time: timestamp.format("%H:%M:%S").to_string(),
            month: timestamp.format("%b").to_string(),
            year: timestamp.format("%Y").to_string(),
            weekday: timestamp.format("%a").to_string(),
        }
    }
}

/// Fields shared by every listening event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub timestamp: DateTime<Utc>,
    pub calendar: CalendarFields,
    /// Full length of the item in seconds, when the export reports it.
    pub duration_secs: Option<i64>,
    /// Seconds actually played.
    pub played_secs: i64,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
    pub shuffle: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicEvent {
    pub id: TrackId,
    pub artist: String,
    pub track: String,
    pub album: String,
    pub playback: PlaybackInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastEvent {
    pub episode: String,
    pub show: Option<String>,
    pub episode_uri: Option<String>,
    pub playback: PlaybackInfo,
}

/// One historical playback: either a music track or a podcast episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    Music(MusicEvent),
    Podcast(PodcastEvent),
}

impl StreamEvent {
    pub fn playback(&self) -> &PlaybackInfo {
        match self {
            StreamEvent::Music(event) => &event.playback,
            StreamEvent::Podcast(event) => &event.playback,
        }
    }

    pub fn track_id(&self) -> Option<&TrackId> {
        match self {
            StreamEvent::Music(event) => Some(&event.id),
            StreamEvent::Podcast(_) => None,
        }
    }

    pub fn episode_name(&self) -> Option<&str> {
        match self {
            StreamEvent::Music(_) => None,
            StreamEvent::Podcast(event) => Some(&event.episode),
        }
    }

    pub fn is_podcast(&self) -> bool {
        matches!(self, StreamEvent::Podcast(_))
    }
}
