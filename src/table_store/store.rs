//! SQLite backed storage of named pipeline tables.

use super::schema::{BASE_DB_VERSION, TABLE_STORE_VERSIONED_SCHEMAS};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Tables produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    /// Every normalized event, music and podcasts.
    AllStreams,
    Streams,
    StreamsFeatures,
    NoSkip,
    PlaylistFeatures,
    Podcasts,
    Wheel,
}

impl TableName {
    pub const ALL: [TableName; 7] = [
        TableName::AllStreams,
        TableName::Streams,
        TableName::StreamsFeatures,
        TableName::NoSkip,
        TableName::PlaylistFeatures,
        TableName::Podcasts,
        TableName::Wheel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::AllStreams => "all_streams",
            TableName::Streams => "streams",
            TableName::StreamsFeatures => "streams_features",
            TableName::NoSkip => "no_skip",
            TableName::PlaylistFeatures => "playlist_features",
            TableName::Podcasts => "podcasts",
            TableName::Wheel => "wheel",
        }
    }

    /// Row type stored in the table.
    pub fn kind(&self) -> &'static str {
        match self {
            TableName::AllStreams => "stream_event",
            TableName::Streams => "music_event",
            TableName::StreamsFeatures | TableName::NoSkip => "enriched_stream",
            TableName::PlaylistFeatures => "enriched_playlist_track",
            TableName::Podcasts => "podcast_event",
            TableName::Wheel => "wheel_row",
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    pub kind: String,
    pub row_count: usize,
    /// Unix timestamp in seconds.
    pub saved_at: i64,
}

#[derive(Clone)]
pub struct SqliteTableStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTableStore {
    /// Opens or creates a store at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open table store at {:?}", db_path))?;
        let store = Self::from_connection(conn)?;
        info!("Opened table store at {:?}", db_path);
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let user_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?;

        if user_version == 0 {
            TABLE_STORE_VERSIONED_SCHEMAS
                .last()
                .context("No schemas defined")?
                .create(&conn)?;
            debug!("Initialized table store schema");
        } else {
            let version = user_version - BASE_DB_VERSION as i64;
            let latest = TABLE_STORE_VERSIONED_SCHEMAS.len() as i64 - 1;
            if version < 0 {
                bail!(
                    "Database version {} is not a table store (base version {})",
                    user_version,
                    BASE_DB_VERSION
                );
            }
            if version > latest {
                bail!(
                    "Table store version {} is too new (max supported: {})",
                    version,
                    latest
                );
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Replaces the contents of a table with `rows`, in order.
    pub fn save_table<T: Serialize>(&self, name: TableName, rows: &[T]) -> Result<()> {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM table_rows WHERE table_name = ?1",
            params![name.as_str()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO saved_tables (name, kind, row_count, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name.as_str(), name.kind(), rows.len() as i64, saved_at],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO table_rows (table_name, row_index, payload) VALUES (?1, ?2, ?3)",
            )?;
            for (index, row) in rows.iter().enumerate() {
                let payload = serde_json::to_string(row)
                    .with_context(|| format!("Failed to serialize row {} of {}", index, name))?;
                stmt.execute(params![name.as_str(), index as i64, payload])?;
            }
        }
        tx.commit()
            .with_context(|| format!("Failed to save table {}", name))?;

        info!("Saved table {} ({} rows)", name, rows.len());
        Ok(())
    }

    /// Loads a table in its saved order, or `None` if it was never saved.
    pub fn load_table<T: DeserializeOwned>(&self, name: TableName) -> Result<Option<Vec<T>>> {
        let conn = self.conn.lock().unwrap();
        let exists = conn
            .query_row(
                "SELECT 1 FROM saved_tables WHERE name = ?1",
                params![name.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT row_index, payload FROM table_rows WHERE table_name = ?1 ORDER BY row_index ASC",
        )?;
        let payloads = stmt
            .query_map(params![name.as_str()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let rows = payloads
            .into_iter()
            .map(|(index, payload)| {
                serde_json::from_str(&payload)
                    .with_context(|| format!("Failed to decode row {} of {}", index, name))
            })
            .collect::<Result<Vec<T>>>()?;

        Ok(Some(rows))
    }

    pub fn list_tables(&self) -> Result<Vec<TableSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT name, kind, row_count, saved_at FROM saved_tables ORDER BY name")?;
        let tables = stmt
            .query_map([], |row| {
                Ok(TableSummary {
                    name: row.get(0)?,
                    kind: row.get(1)?,
                    row_count: row.get::<_, i64>(2)? as usize,
                    saved_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }
}
