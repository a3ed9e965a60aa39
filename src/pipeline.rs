//! End to end ingestion: history, enrichment and persistence.

use crate::catalog::{CatalogAdapter, CatalogClient, PlaylistTrack};
use crate::enrichment::{self, MergeOptions};
use crate::history::{self, HistoryError, NormalizeReport, NormalizedHistory, StreamEvent};
use crate::matching::{self, CompatibilityQuery, CompatibilityResult, Matchable};
use crate::table_store::{SqliteTableStore, TableName};
use crate::wheel::HarmonicWheel;
use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

/// Row counts of every table written by [`ingest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub history: NormalizeReport,
    pub all_streams: usize,
    pub streams: usize,
    pub podcasts: usize,
    pub streams_features: usize,
    pub no_skip: usize,
    pub playlist_tracks: usize,
    pub playlist_features: usize,
    pub wheel: usize,
}

/// Reads and normalizes the export documents in `dir`.
///
/// A missing or empty export is not an error: the history is empty.
pub fn load_history(dir: &Path) -> Result<NormalizedHistory> {
    let documents = match history::load_export_documents(dir) {
        Ok(documents) => documents,
        Err(HistoryError::MissingData(reason)) => {
            warn!("No streaming history loaded: {}", reason);
            return Ok(NormalizedHistory::default());
        }
        Err(e) => return Err(e).context("Failed to load streaming history"),
    };

    match history::normalize(documents) {
        Ok(history) => Ok(history),
        Err(HistoryError::MissingData(reason)) => {
            warn!("No streaming history loaded: {}", reason);
            Ok(NormalizedHistory::default())
        }
        Err(e) => Err(e).context("Failed to normalize streaming history"),
    }
}

/// Fetches every configured playlist, in order.
pub fn fetch_playlists<C: CatalogClient>(
    adapter: &CatalogAdapter<C>,
    playlists: &[String],
) -> Result<Vec<PlaylistTrack>> {
    let mut tracks = Vec::new();
    for playlist in playlists {
        let fetched = adapter
            .fetch_playlist(playlist)
            .with_context(|| format!("Failed to fetch playlist {}", playlist))?;
        tracks.extend(fetched);
    }
    Ok(tracks)
}

/// Runs the whole pipeline and persists every table.
///
/// Nothing is written until every catalog lookup has succeeded, so a failed
/// run leaves the tables of the previous run untouched.
pub fn ingest<C: CatalogClient>(
    adapter: &CatalogAdapter<C>,
    wheel: &HarmonicWheel,
    store: &SqliteTableStore,
    history_dir: &Path,
    playlists: &[String],
    options: &MergeOptions,
) -> Result<IngestReport> {
    let NormalizedHistory {
        events,
        report: history,
    } = load_history(history_dir)?;
    let all_streams = events.clone();
    let (streams, podcasts) = history::partition(events);

    let streams_features = enrichment::merge(adapter, wheel, &streams, options)
        .context("Failed to enrich streaming history")?;
    let no_skip = enrichment::non_skipped(&streams_features);

    let playlist_tracks = fetch_playlists(adapter, playlists)?;
    let playlist_features = enrichment::merge(adapter, wheel, &playlist_tracks, options)
        .context("Failed to enrich playlists")?;
    let wheel_rows = wheel.table_rows();

    store.save_table::<StreamEvent>(TableName::AllStreams, &all_streams)?;
    store.save_table(TableName::Streams, &streams)?;
    store.save_table(TableName::Podcasts, &podcasts)?;
    store.save_table(TableName::StreamsFeatures, &streams_features)?;
    store.save_table(TableName::NoSkip, &no_skip)?;
    store.save_table(TableName::PlaylistFeatures, &playlist_features)?;
    store.save_table(TableName::Wheel, &wheel_rows)?;

    let report = IngestReport {
        history,
        all_streams: all_streams.len(),
        streams: streams.len(),
        podcasts: podcasts.len(),
        streams_features: streams_features.len(),
        no_skip: no_skip.len(),
        playlist_tracks: playlist_tracks.len(),
        playlist_features: playlist_features.len(),
        wheel: wheel_rows.len(),
    };
    info!("Ingestion complete: {:?}", report);
    Ok(report)
}

/// Runs a compatibility query against a persisted enriched table.
pub fn query_table<R>(
    store: &SqliteTableStore,
    wheel: &HarmonicWheel,
    table: TableName,
    query: &CompatibilityQuery,
    rng: &mut impl Rng,
) -> Result<CompatibilityResult<R>>
where
    R: Matchable + Clone + DeserializeOwned,
{
    let Some(rows) = store.load_table::<R>(table)? else {
        bail!("Table {} has not been saved yet, run ingest first", table);
    };
    let result = matching::find_compatible(&rows, wheel, query, rng)
        .with_context(|| format!("Compatibility query on {} failed", table))?;
    info!(
        "Found {} tracks compatible with {}",
        result.candidates.len(),
        result.reference.track_id()
    );
    Ok(result)
}
