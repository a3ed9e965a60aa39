//! Streaming history export fixtures.

use super::constants::*;
use harmonic_history::catalog::{PlaylistTrack, TrackId};
use serde_json::json;
use std::path::Path;

/// Records in [`write_history_dir`] that are neither music nor podcast.
#[allow(dead_code)]
pub const HISTORY_SKIPPED_RECORDS: usize = 1;

pub fn track_id(id: &str) -> TrackId {
    TrackId::parse(id).unwrap()
}

fn play(ts: &str, id: &str, track: &str, ms_played: i64) -> serde_json::Value {
    json!({
        "ts": ts,
        "username": "listener",
        "platform": "Android OS 11 API 30 (Google, Pixel 4a)",
        "ms_played": ms_played,
        "conn_country": "IT",
        "ip_addr_decrypted": "10.0.0.1",
        "user_agent_decrypted": "unknown",
        "master_metadata_track_name": track,
        "master_metadata_album_artist_name": format!("{} artist", track),
        "master_metadata_album_album_name": format!("{} album", track),
        "spotify_track_uri": format!("spotify:track:{}", id),
        "episode_name": null,
        "episode_show_name": null,
        "spotify_episode_uri": null,
        "reason_start": "trackdone",
        "reason_end": "trackdone",
        "shuffle": false,
        "skipped": null,
        "offline": false,
        "offline_timestamp": 0,
        "incognito_mode": false
    })
}

/// Writes two export documents and an unrelated file into `dir`.
///
/// The history holds eight classifiable events (seven music plays, one
/// podcast episode) and one record that is neither.
#[allow(dead_code)]
pub fn write_history_dir(dir: &Path) {
    let early = json!([
        play("2021-05-01T08:00:00Z", TRACK_C_MAJOR, "Major Song", 190_000),
        play("2021-05-01T08:05:00Z", TRACK_DOUBLE_TIME, "Double Song", 30_000),
        {
            "ts": "2021-05-01T08:10:00Z",
            "ms_played": 1_800_000,
            "master_metadata_track_name": null,
            "spotify_track_uri": null,
            "episode_name": "Episode 42",
            "episode_show_name": "The Show",
            "spotify_episode_uri": "spotify:episode:5u6sxIQKhYfBXBazqUuBUu",
            "reason_start": "clickrow",
            "reason_end": "endplay",
            "shuffle": false
        }
    ]);
    let late = json!([
        play("2021-06-01T10:00:00Z", TRACK_FAR_TEMPO, "Far Song", 200_000),
        play("2021-06-01T10:05:00Z", TRACK_A_MINOR, "Minor Song", 160_000),
        play("2021-06-01T10:10:00Z", TRACK_NO_KEY, "Keyless Song", 10_000),
        play("2021-06-01T10:15:00Z", TRACK_WITHOUT_FEATURES, "Unknown Song", 100_000),
        play("2021-06-01T10:20:00Z", TRACK_C_MAJOR, "Major Song", 150_000),
        {
            "ts": "2021-06-01T10:25:00Z",
            "ms_played": 1_000,
            "spotify_track_uri": null,
            "episode_name": null
        }
    ]);

    std::fs::write(dir.join("endsong_0.json"), early.to_string()).unwrap();
    std::fs::write(
        dir.join("Streaming_History_Audio_2021_0.json"),
        late.to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("Userdata.json"), r#"{"username": "listener"}"#).unwrap();
}

/// A playlist of `n` distinct tracks named after their position.
#[allow(dead_code)]
pub fn generated_playlist(n: usize) -> Vec<PlaylistTrack> {
    (0..n)
        .map(|i| PlaylistTrack {
            artist: format!("Artist {}", i),
            track: format!("Track {}", i),
            album: format!("Album {}", i / 10),
            id: track_id(&format!("generated{:04}", i)),
        })
        .collect()
}
