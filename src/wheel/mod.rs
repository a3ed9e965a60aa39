//! Camelot harmonic wheel.
//!
//! Maps the catalog's raw pitch class and mode values onto key signatures and
//! wheel positions, and answers which positions are harmonically reachable
//! from a given one.

mod key;
mod table;

pub use key::{KeySignature, Mode, PitchClass, NO_KEY_DETECTED};
pub use table::{
    HarmonicWheel, Relation, RelationTarget, WheelError, WheelPosition, WheelRow, WheelTableRow,
};
