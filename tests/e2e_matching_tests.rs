//! End-to-end tests for compatibility queries over enriched tables.

mod common;

use common::*;
use harmonic_history::enrichment::{self, EnrichedPlaylistTrack, EnrichedStream, MergeOptions};
use harmonic_history::matching::{find_compatible, CompatibilityQuery, MatchError, Selector};
use harmonic_history::pipeline;
use harmonic_history::table_store::{SqliteTableStore, TableName};
use harmonic_history::wheel::{HarmonicWheel, Relation};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn enriched_playlist() -> Vec<EnrichedPlaylistTrack> {
    let adapter = fake_adapter(FakeCatalog::with_known_tracks());
    let tracks = adapter.fetch_playlist(PLAYLIST_ID).unwrap();
    enrichment::merge(
        &adapter,
        HarmonicWheel::load(),
        &tracks,
        &MergeOptions::default(),
    )
    .unwrap()
}

/// Ingests the fixture history into an in-memory store.
fn ingested_store() -> (TempDir, SqliteTableStore) {
    let dir = TempDir::new().unwrap();
    write_history_dir(dir.path());
    let store = SqliteTableStore::in_memory().unwrap();
    let adapter = fake_adapter(FakeCatalog::with_known_tracks());
    pipeline::ingest(
        &adapter,
        HarmonicWheel::load(),
        &store,
        dir.path(),
        &[PLAYLIST_ID.to_string()],
        &MergeOptions::default(),
    )
    .unwrap();
    (dir, store)
}

fn by_id(id: &str) -> CompatibilityQuery {
    CompatibilityQuery::with_selector(Selector::ById(track_id(id)))
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn titles(rows: &[EnrichedPlaylistTrack]) -> Vec<&str> {
    rows.iter().map(|r| r.track.as_str()).collect()
}

fn stream_ids(rows: &[EnrichedStream]) -> Vec<&str> {
    rows.iter().map(|r| r.event.id.as_str()).collect()
}

#[test]
fn test_same_key_matches_double_time() {
    let rows = enriched_playlist();
    let result = find_compatible(&rows, HarmonicWheel::load(), &by_id(TRACK_C_MAJOR), &mut rng())
        .unwrap();

    assert_eq!(result.reference.track, "Major Song");
    assert_eq!(titles(&result.candidates), vec!["Major Song", "Double Song"]);
}

#[test]
fn test_exclude_reference() {
    let rows = enriched_playlist();
    let mut query = by_id(TRACK_C_MAJOR);
    query.exclude_reference = true;

    let result = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(titles(&result.candidates), vec!["Double Song"]);
}

#[test]
fn test_parallel_relation_adds_relative_minor() {
    let rows = enriched_playlist();
    let mut query = by_id(TRACK_C_MAJOR);
    query.relations = vec![Relation::Same, Relation::Parallel];

    let result = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(
        titles(&result.candidates),
        vec!["Major Song", "Minor Song", "Double Song"]
    );

    query.relations = vec![Relation::Parallel];
    let result = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(titles(&result.candidates), vec!["Minor Song"]);
}

#[test]
fn test_narrow_tempo_tolerance() {
    let rows = enriched_playlist();
    let mut query = by_id(TRACK_C_MAJOR);
    query.relations = vec![Relation::All];
    query.tempo_tolerance = 2.0;

    // 85 is too far from 80, 158 halves to 79.
    let result = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(titles(&result.candidates), vec!["Major Song", "Double Song"]);
}

#[test]
fn test_streams_are_deduplicated_before_matching() {
    let (_dir, store) = ingested_store();
    let rows: Vec<EnrichedStream> = store
        .load_table(TableName::StreamsFeatures)
        .unwrap()
        .unwrap();
    assert_eq!(rows.len(), 6);

    let result = find_compatible(&rows, HarmonicWheel::load(), &by_id(TRACK_C_MAJOR), &mut rng())
        .unwrap();
    assert_eq!(
        stream_ids(&result.candidates),
        vec![TRACK_C_MAJOR, TRACK_DOUBLE_TIME]
    );
}

#[test]
fn test_index_selects_from_deduplicated_rows() {
    let (_dir, store) = ingested_store();
    let rows: Vec<EnrichedStream> = store
        .load_table(TableName::StreamsFeatures)
        .unwrap()
        .unwrap();

    // Unique order: C major, double time, far tempo, A minor, no key.
    let query = CompatibilityQuery::with_selector(Selector::ByIndex(2));
    let result = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(result.reference.event.id, track_id(TRACK_FAR_TEMPO));
    assert_eq!(stream_ids(&result.candidates), vec![TRACK_FAR_TEMPO]);

    let query = CompatibilityQuery::with_selector(Selector::ByIndex(5));
    let err = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap_err();
    assert!(matches!(err, MatchError::IndexOutOfRange { index: 5, len: 5 }));
}

#[test]
fn test_reference_without_key_is_rejected() {
    let (_dir, store) = ingested_store();
    let rows: Vec<EnrichedStream> = store
        .load_table(TableName::StreamsFeatures)
        .unwrap()
        .unwrap();

    let err = find_compatible(&rows, HarmonicWheel::load(), &by_id(TRACK_NO_KEY), &mut rng())
        .unwrap_err();
    assert!(matches!(err, MatchError::ReferenceWithoutKey(id) if id == track_id(TRACK_NO_KEY)));
}

#[test]
fn test_unknown_reference_and_missing_selection() {
    let rows = enriched_playlist();

    let err = find_compatible(&rows, HarmonicWheel::load(), &by_id(TRACK_FAR_TEMPO), &mut rng())
        .unwrap_err();
    assert!(matches!(err, MatchError::TrackNotFound(_)));

    let err = find_compatible(
        &rows,
        HarmonicWheel::load(),
        &CompatibilityQuery::default(),
        &mut rng(),
    )
    .unwrap_err();
    assert!(matches!(err, MatchError::NoSelection));

    assert!(matches!(
        Selector::from_flags(Some(TRACK_C_MAJOR), Some(0), false),
        Err(MatchError::NoSelection)
    ));
}

#[test]
fn test_seeded_random_selection_is_reproducible() {
    let rows = enriched_playlist();
    let query = CompatibilityQuery::with_selector(Selector::Random);

    let first = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    let second = find_compatible(&rows, HarmonicWheel::load(), &query, &mut rng()).unwrap();
    assert_eq!(first, second);
    assert!(rows.contains(&first.reference));
    assert!(first.candidates.contains(&first.reference));
}

#[test]
fn test_query_persisted_table() {
    let (_dir, store) = ingested_store();
    let mut query = by_id(TRACK_C_MAJOR);
    query.relations = vec![Relation::All];

    let result = pipeline::query_table::<EnrichedStream>(
        &store,
        HarmonicWheel::load(),
        TableName::NoSkip,
        &query,
        &mut rng(),
    )
    .unwrap();
    assert_eq!(
        stream_ids(&result.candidates),
        vec![TRACK_C_MAJOR, TRACK_A_MINOR]
    );

    let result = pipeline::query_table::<EnrichedPlaylistTrack>(
        &store,
        HarmonicWheel::load(),
        TableName::PlaylistFeatures,
        &query,
        &mut rng(),
    )
    .unwrap();
    assert_eq!(
        titles(&result.candidates),
        vec!["Major Song", "Minor Song", "Double Song"]
    );
}

#[test]
fn test_query_unsaved_table_fails() {
    let store = SqliteTableStore::in_memory().unwrap();
    let result = pipeline::query_table::<EnrichedStream>(
        &store,
        HarmonicWheel::load(),
        TableName::NoSkip,
        &by_id(TRACK_C_MAJOR),
        &mut rng(),
    );
    assert!(result.is_err());
}
