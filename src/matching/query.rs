use crate::catalog::TrackId;
use crate::wheel::{Relation, WheelError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Exactly one of track id, index or random selection must be given")]
    NoSelection,

    #[error("Track {0} is not in the table")]
    TrackNotFound(TrackId),

    #[error("Index {index} is out of range for {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Reference track {0} has no detected key")]
    ReferenceWithoutKey(TrackId),

    #[error("The table has no tracks")]
    EmptyCandidates,

    #[error(transparent)]
    Wheel(#[from] WheelError),
}

/// How the reference track is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    ById(TrackId),
    /// Position in the deduplicated table.
    ByIndex(usize),
    Random,
}

impl Selector {
    /// Builds a selector from mutually exclusive command line style flags.
    pub fn from_flags(id: Option<&str>, index: Option<usize>, random: bool) -> Result<Self, MatchError> {
        match (id, index, random) {
            (Some(id), None, false) => TrackId::parse(id)
                .map(Selector::ById)
                .ok_or(MatchError::NoSelection),
            (None, Some(index), false) => Ok(Selector::ByIndex(index)),
            (None, None, true) => Ok(Selector::Random),
            _ => Err(MatchError::NoSelection),
        }
    }
}

/// Parameters of one compatibility query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityQuery {
    pub selector: Option<Selector>,
    /// Allowed distance in BPM from the reference tempo.
    pub tempo_tolerance: f64,
    pub relations: Vec<Relation>,
    /// Leave the reference itself out of the candidates.
    pub exclude_reference: bool,
}

impl Default for CompatibilityQuery {
    fn default() -> Self {
        Self {
            selector: None,
            tempo_tolerance: 10.0,
            relations: vec![Relation::Same],
            exclude_reference: false,
        }
    }
}

impl CompatibilityQuery {
    pub fn with_selector(selector: Selector) -> Self {
        Self {
            selector: Some(selector),
            ..Default::default()
        }
    }
}
