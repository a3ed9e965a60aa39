//! Schema definition for persisted tables.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Offset added to the schema index when stored in `PRAGMA user_version`.
pub const BASE_DB_VERSION: usize = 100;

pub struct TableStoreSchema {
    pub version: usize,
    pub up: &'static str,
}

impl TableStoreSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(self.up)
            .with_context(|| format!("Failed to create table store schema v{}", self.version))?;
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }
}

pub const TABLE_STORE_VERSIONED_SCHEMAS: &[TableStoreSchema] = &[TableStoreSchema {
    version: 0,
    up: r#"
            CREATE TABLE IF NOT EXISTS saved_tables (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                saved_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS table_rows (
                table_name TEXT NOT NULL REFERENCES saved_tables(name) ON DELETE CASCADE,
                row_index INTEGER NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (table_name, row_index)
            );
        "#,
}];
