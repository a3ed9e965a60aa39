//! Raw export documents as found on disk.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// File name prefixes of the export formats we understand.
const EXPORT_FILE_PREFIXES: &[&str] = &["endsong", "Streaming_History_Audio"];

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No streaming history found in {0}")]
    MissingData(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to scan history directory: {0}")]
    Scan(#[from] walkdir::Error),
}

/// One record of an export document.
///
/// Only the fields the pipeline needs are deserialized. Identifying fields
/// present in the export (username, conn_country, ip_addr_decrypted,
/// user_agent_decrypted, platform, incognito_mode, offline,
/// offline_timestamp, skipped) are ignored on purpose and never reach memory
/// past parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStreamRecord {
    pub ts: Option<String>,
    pub ms_played: Option<i64>,
    pub duration_ms: Option<i64>,
    pub master_metadata_track_name: Option<String>,
    pub master_metadata_album_artist_name: Option<String>,
    pub master_metadata_album_album_name: Option<String>,
    pub spotify_track_uri: Option<String>,
    pub episode_name: Option<String>,
    pub episode_show_name: Option<String>,
    pub spotify_episode_uri: Option<String>,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
    pub shuffle: Option<bool>,
}

/// A parsed export file.
#[derive(Debug, Clone, Default)]
pub struct ExportDocument {
    pub source: String,
    pub records: Vec<RawStreamRecord>,
}

impl ExportDocument {
    pub fn from_json(source: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            source: source.into(),
            records: serde_json::from_str(json)?,
        })
    }
}

fn is_export_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && EXPORT_FILE_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Loads every export document found directly inside `dir`.
///
/// Fails with [`HistoryError::MissingData`] when the directory holds none.
pub fn load_export_documents(dir: &Path) -> Result<Vec<ExportDocument>, HistoryError> {
    if !dir.is_dir() {
        return Err(HistoryError::MissingData(dir.display().to_string()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_export_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(HistoryError::MissingData(dir.display().to_string()));
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;
        let document = ExportDocument::from_json(path.display().to_string(), &content)
            .map_err(|source| HistoryError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(
            "Loaded {} records from {}",
            document.records.len(),
            document.source
        );
        documents.push(document);
    }

    info!("Loaded {} export documents from {:?}", documents.len(), dir);
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECORD: &str = r#"[{
        "ts": "2021-05-01T10:00:00Z",
        "username": "someone",
        "ip_addr_decrypted": "10.0.0.1",
        "ms_played": 1000,
        "spotify_track_uri": "spotify:track:abc"
    }]"#;

    #[test]
    fn test_export_file_names() {
        assert!(is_export_file(Path::new("endsong.json")));
        assert!(is_export_file(Path::new("endsong_3.json")));
        assert!(is_export_file(Path::new("Streaming_History_Audio_2020-2021_0.json")));
        assert!(!is_export_file(Path::new("Userdata.json")));
        assert!(!is_export_file(Path::new("endsong.txt")));
    }

    #[test]
    fn test_missing_directory_is_missing_data() {
        let result = load_export_documents(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(HistoryError::MissingData(_))));
    }

    #[test]
    fn test_empty_directory_is_missing_data() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let result = load_export_documents(dir.path());
        assert!(matches!(result, Err(HistoryError::MissingData(_))));
    }

    #[test]
    fn test_loads_all_export_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("endsong_0.json"), RECORD).unwrap();
        std::fs::write(dir.path().join("endsong_1.json"), RECORD).unwrap();
        std::fs::write(dir.path().join("Userdata.json"), "{}").unwrap();

        let documents = load_export_documents(dir.path()).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].records.len(), 1);
        assert_eq!(
            documents[0].records[0].spotify_track_uri.as_deref(),
            Some("spotify:track:abc")
        );
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("endsong.json"), "{not json").unwrap();
        let result = load_export_documents(dir.path());
        assert!(matches!(result, Err(HistoryError::Parse { .. })));
    }
}
