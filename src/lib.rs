//! Harmonic History Library
//!
//! Turns a streaming history export into tempo and key annotated tables and
//! answers harmonic mixing queries over them.

pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod history;
pub mod matching;
pub mod pipeline;
pub mod table_store;
pub mod wheel;

// Re-export commonly used types for convenience
pub use catalog::{CatalogAdapter, CatalogClient, SpotifyClient, TrackId};
pub use table_store::{SqliteTableStore, TableName};
pub use wheel::HarmonicWheel;
