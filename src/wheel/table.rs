//! The Camelot compatibility table.

use super::key::KeySignature;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::debug;

const BUNDLED_WHEEL_JSON: &str = include_str!("camelot.json");

lazy_static! {
    static ref BUNDLED_WHEEL: HarmonicWheel =
        HarmonicWheel::from_json(BUNDLED_WHEEL_JSON).expect("bundled camelot table is invalid");
}

#[derive(Debug, Error)]
pub enum WheelError {
    #[error("Unknown key signature: {0}")]
    UnknownKeySignature(String),

    #[error("Unknown wheel position: {0}")]
    UnknownPosition(String),

    #[error("Invalid wheel table: {0}")]
    InvalidTable(String),
}

/// A position on the Camelot wheel, e.g. "8B".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WheelPosition(String);

impl WheelPosition {
    pub fn new(position: impl Into<String>) -> Self {
        Self(position.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named shifts from one wheel position to its harmonic neighbours.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The position itself.
    Same,
    /// One step clockwise, same letter.
    Up,
    /// One step counter-clockwise, same letter.
    Down,
    /// Same number, other letter (relative major/minor).
    Parallel,
    /// One step and a letter switch.
    Diagonal,
    /// Same, up, down and parallel together.
    All,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Same => "same",
            Relation::Up => "up",
            Relation::Down => "down",
            Relation::Parallel => "parallel",
            Relation::Diagonal => "diagonal",
            Relation::All => "all",
        }
    }
}

/// Target of a relation: one position or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationTarget {
    Single(WheelPosition),
    Many(Vec<WheelPosition>),
}

impl RelationTarget {
    pub fn positions(&self) -> &[WheelPosition] {
        match self {
            RelationTarget::Single(position) => std::slice::from_ref(position),
            RelationTarget::Many(positions) => positions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelRow {
    pub key_signature: String,
    #[serde(flatten)]
    pub relations: BTreeMap<Relation, RelationTarget>,
}

/// Row of the wheel as persisted by the table store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelTableRow {
    pub camelot: WheelPosition,
    pub key_signature: String,
    pub relations: BTreeMap<Relation, RelationTarget>,
}

/// Read-only harmonic compatibility structure.
#[derive(Debug, Clone)]
pub struct HarmonicWheel {
    rows: BTreeMap<WheelPosition, WheelRow>,
    by_signature: HashMap<String, WheelPosition>,
}

impl HarmonicWheel {
    /// The bundled wheel, parsed once per process.
    pub fn load() -> &'static HarmonicWheel {
        &BUNDLED_WHEEL
    }

    pub fn from_json(json: &str) -> Result<Self, WheelError> {
        let rows: BTreeMap<WheelPosition, WheelRow> =
            serde_json::from_str(json).map_err(|e| WheelError::InvalidTable(e.to_string()))?;
        Self::from_rows(rows)
    }

    /// Builds a wheel, checking that signatures are unique and that every
    /// relation points at an existing row.
    pub fn from_rows(rows: BTreeMap<WheelPosition, WheelRow>) -> Result<Self, WheelError> {
        if rows.is_empty() {
            return Err(WheelError::InvalidTable("no rows".to_string()));
        }

        let mut by_signature = HashMap::with_capacity(rows.len());
        for (position, row) in &rows {
            if let Some(previous) = by_signature.insert(row.key_signature.clone(), position.clone())
            {
                return Err(WheelError::InvalidTable(format!(
                    "key signature '{}' appears at both {} and {}",
                    row.key_signature, previous, position
                )));
            }
            for (relation, target) in &row.relations {
                for target_position in target.positions() {
                    if !rows.contains_key(target_position) {
                        return Err(WheelError::InvalidTable(format!(
                            "relation '{}' of {} points at missing position {}",
                            relation.as_str(),
                            position,
                            target_position
                        )));
                    }
                }
            }
        }

        Ok(Self { rows, by_signature })
    }

    /// Rebuilds a wheel from rows previously produced by [`Self::table_rows`].
    pub fn from_table_rows(rows: Vec<WheelTableRow>) -> Result<Self, WheelError> {
        let rows = rows
            .into_iter()
            .map(|r| {
                (
                    r.camelot,
                    WheelRow {
                        key_signature: r.key_signature,
                        relations: r.relations,
                    },
                )
            })
            .collect();
        Self::from_rows(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: &WheelPosition) -> Option<&WheelRow> {
        self.rows.get(position)
    }

    pub fn table_rows(&self) -> Vec<WheelTableRow> {
        self.rows
            .iter()
            .map(|(camelot, row)| WheelTableRow {
                camelot: camelot.clone(),
                key_signature: row.key_signature.clone(),
                relations: row.relations.clone(),
            })
            .collect()
    }

    /// Looks up the wheel position whose key signature label equals the input.
    pub fn key_signature_to_camelot(&self, key_signature: &str) -> Result<WheelPosition, WheelError> {
        self.by_signature
            .get(key_signature)
            .cloned()
            .ok_or_else(|| WheelError::UnknownKeySignature(key_signature.to_string()))
    }

    /// Maps a key signature onto the wheel. Undetected keys have no position.
    pub fn camelot_for(&self, key: &KeySignature) -> Result<Option<WheelPosition>, WheelError> {
        if !key.is_detected() {
            return Ok(None);
        }
        self.key_signature_to_camelot(&key.to_string()).map(Some)
    }

    /// Union of the positions reachable from `from` through each relation.
    pub fn reachable(
        &self,
        from: &WheelPosition,
        relations: &[Relation],
    ) -> Result<BTreeSet<WheelPosition>, WheelError> {
        let row = self
            .rows
            .get(from)
            .ok_or_else(|| WheelError::UnknownPosition(from.to_string()))?;

        let mut reachable = BTreeSet::new();
        for relation in relations {
            match row.relations.get(relation) {
                Some(target) => reachable.extend(target.positions().iter().cloned()),
                None => debug!("Wheel row {} has no '{}' relation", from, relation.as_str()),
            }
        }
        Ok(reachable)
    }
}
