//! Joins listening or playlist rows with batched audio features.

use super::models::{EnrichedStream, Enrichable, TrackFeatures};
use crate::catalog::{
    AudioFeatures, CatalogAdapter, CatalogClient, CatalogError, TrackId,
    AUDIO_FEATURES_BATCH_LIMIT,
};
use crate::wheel::{HarmonicWheel, KeySignature, WheelError};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fraction of a track that must be played for a stream to count as not skipped.
pub const NO_SKIP_RATIO: f64 = 0.75;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Catalog returned no audio features for {requested} tracks")]
    NoFeatures { requested: usize },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Ids per feature request, clamped to `1..=50`.
    pub batch_window: usize,
    /// Only the first `max_items` rows are considered when set.
    pub max_items: Option<usize>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            batch_window: AUDIO_FEATURES_BATCH_LIMIT,
            max_items: None,
        }
    }
}

impl MergeOptions {
    fn window(&self) -> usize {
        self.batch_window.clamp(1, AUDIO_FEATURES_BATCH_LIMIT)
    }
}

/// Distinct ids in first-seen order.
fn unique_ids<R: Enrichable>(rows: &[R]) -> Vec<TrackId> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .map(|r| r.track_id())
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

fn features_by_id(
    wheel: &HarmonicWheel,
    records: Vec<AudioFeatures>,
) -> HashMap<TrackId, TrackFeatures> {
    let mut by_id = HashMap::with_capacity(records.len());
    for record in records {
        if by_id.contains_key(&record.id) {
            continue;
        }
        let key_signature = KeySignature::from_catalog(record.key, record.mode);
        let camelot = match wheel.camelot_for(&key_signature) {
            Ok(camelot) => camelot,
            Err(WheelError::UnknownKeySignature(signature)) => {
                warn!(
                    "Skipping features of {}: key signature '{}' is not on the wheel",
                    record.id, signature
                );
                continue;
            }
            Err(e) => {
                warn!("Skipping features of {}: {}", record.id, e);
                continue;
            }
        };
        let features = TrackFeatures::new(&record, camelot);
        by_id.insert(record.id, features);
    }
    by_id
}

/// Enriches rows with tempo, key signature and wheel position.
///
/// Rows whose track has no features are dropped; the rest keep their input
/// order and multiplicity.
pub fn merge<C, R>(
    adapter: &CatalogAdapter<C>,
    wheel: &HarmonicWheel,
    rows: &[R],
    options: &MergeOptions,
) -> Result<Vec<R::Output>, EnrichmentError>
where
    C: CatalogClient,
    R: Enrichable,
{
    let rows = match options.max_items {
        Some(max_items) => &rows[..rows.len().min(max_items)],
        None => rows,
    };

    let ids = unique_ids(rows);
    if ids.is_empty() {
        debug!("Nothing to enrich");
        return Ok(Vec::new());
    }

    let mut records = Vec::with_capacity(ids.len());
    for (batch_index, batch) in ids.chunks(options.window()).enumerate() {
        let fetched = adapter.fetch_audio_features(batch)?;
        debug!(
            "Feature batch {}: {} of {} ids resolved",
            batch_index,
            fetched.len(),
            batch.len()
        );
        records.extend(fetched);
    }

    if records.is_empty() {
        return Err(EnrichmentError::NoFeatures {
            requested: ids.len(),
        });
    }

    let by_id = features_by_id(wheel, records);
    let merged: Vec<R::Output> = rows
        .iter()
        .filter_map(|row| by_id.get(row.track_id()).map(|f| row.enrich(f)))
        .collect();

    info!(
        "Merged features into {} of {} rows ({} distinct tracks)",
        merged.len(),
        rows.len(),
        ids.len()
    );
    Ok(merged)
}

/// Streams that were played past [`NO_SKIP_RATIO`] of their length.
pub fn non_skipped(streams: &[EnrichedStream]) -> Vec<EnrichedStream> {
    streams
        .iter()
        .filter(|s| s.played_ratio().is_some_and(|ratio| ratio > NO_SKIP_RATIO))
        .cloned()
        .collect()
}
