//! Selection of harmonically and rhythmically compatible tracks.

use super::query::{CompatibilityQuery, MatchError, Selector};
use crate::catalog::TrackId;
use crate::enrichment::{EnrichedPlaylistTrack, EnrichedStream};
use crate::wheel::{HarmonicWheel, WheelPosition};
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// A row that can take part in a compatibility query.
pub trait Matchable {
    fn track_id(&self) -> &TrackId;

    fn tempo(&self) -> i64;

    fn camelot(&self) -> Option<&WheelPosition>;
}

impl Matchable for EnrichedStream {
    fn track_id(&self) -> &TrackId {
        &self.event.id
    }

    fn tempo(&self) -> i64 {
        self.features.tempo
    }

    fn camelot(&self) -> Option<&WheelPosition> {
        self.features.camelot.as_ref()
    }
}

impl Matchable for EnrichedPlaylistTrack {
    fn track_id(&self) -> &TrackId {
        &self.id
    }

    fn tempo(&self) -> i64 {
        self.tempo
    }

    fn camelot(&self) -> Option<&WheelPosition> {
        self.camelot.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityResult<R> {
    pub reference: R,
    pub candidates: Vec<R>,
}

/// True when `tempo`, its double or its half lies within `tolerance` of
/// `reference`.
pub fn tempo_matches(reference: f64, tempo: f64, tolerance: f64) -> bool {
    let range = (reference - tolerance)..=(reference + tolerance);
    [tempo, tempo * 2.0, tempo / 2.0]
        .iter()
        .any(|t| range.contains(t))
}

fn dedup_by_id<R: Matchable>(rows: &[R]) -> Vec<&R> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut unique = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(row.track_id()) {
            unique.push(row);
        }
    }
    unique
}

fn select_reference<'a, R: Matchable>(
    rows: &[&'a R],
    selector: &Selector,
    rng: &mut impl Rng,
) -> Result<&'a R, MatchError> {
    match selector {
        Selector::ById(id) => rows
            .iter()
            .find(|r| r.track_id() == id)
            .copied()
            .ok_or_else(|| MatchError::TrackNotFound(id.clone())),
        Selector::ByIndex(index) => {
            rows.get(*index)
                .copied()
                .ok_or(MatchError::IndexOutOfRange {
                    index: *index,
                    len: rows.len(),
                })
        }
        Selector::Random => Ok(rows[rng.random_range(0..rows.len())]),
    }
}

/// Finds the rows compatible with a reference track.
///
/// Rows are deduplicated by track id first. A candidate matches when its
/// wheel position is reachable from the reference through the query's
/// relations and its tempo matches within the tolerance. Rows without a
/// detected key never match.
pub fn find_compatible<R>(
    rows: &[R],
    wheel: &HarmonicWheel,
    query: &CompatibilityQuery,
    rng: &mut impl Rng,
) -> Result<CompatibilityResult<R>, MatchError>
where
    R: Matchable + Clone,
{
    let selector = query.selector.as_ref().ok_or(MatchError::NoSelection)?;

    let unique = dedup_by_id(rows);
    if unique.is_empty() {
        return Err(MatchError::EmptyCandidates);
    }

    let reference = select_reference(&unique, selector, rng)?;
    let reference_position = reference
        .camelot()
        .ok_or_else(|| MatchError::ReferenceWithoutKey(reference.track_id().clone()))?;

    let keys = wheel.reachable(reference_position, &query.relations)?;
    let reference_tempo = reference.tempo() as f64;
    debug!(
        "Reference {} at {} BPM, {} reachable positions",
        reference.track_id(),
        reference.tempo(),
        keys.len()
    );

    let candidates = unique
        .iter()
        .filter(|r| !(query.exclude_reference && r.track_id() == reference.track_id()))
        .filter(|r| r.camelot().is_some_and(|c| keys.contains(c)))
        .filter(|r| tempo_matches(reference_tempo, r.tempo() as f64, query.tempo_tolerance))
        .map(|r| (*r).clone())
        .collect();

    Ok(CompatibilityResult {
        reference: reference.clone(),
        candidates,
    })
}
