//! Musical key signatures as reported by the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for tracks the catalog could not detect a key for.
pub const NO_KEY_DETECTED: &str = "no key detected";

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "D-flat", "D", "E-flat", "E", "F", "F-sharp", "G", "A-flat", "A", "B-flat", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// Catalog mode flag: 1 is major, anything else is minor.
    pub fn from_flag(flag: i32) -> Self {
        if flag == 1 {
            Mode::Major
        } else {
            Mode::Minor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

/// Pitch class in standard notation, 0 = C through 11 = B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct PitchClass(u8);

impl PitchClass {
    pub fn new(value: i32) -> Option<Self> {
        if (0..12).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        PITCH_CLASS_NAMES[self.0 as usize]
    }
}

impl TryFrom<i32> for PitchClass {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        PitchClass::new(value).ok_or_else(|| format!("pitch class out of range: {}", value))
    }
}

impl From<PitchClass> for i32 {
    fn from(pitch_class: PitchClass) -> Self {
        pitch_class.0 as i32
    }
}

/// A key signature derived from the catalog's raw pitch class and mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeySignature {
    Detected { pitch_class: PitchClass, mode: Mode },
    Undetected,
}

impl KeySignature {
    /// Builds a key signature from raw catalog values.
    ///
    /// The catalog reports -1 when no key was detected. Any other value outside
    /// 0..=11 is treated the same way.
    pub fn from_catalog(key: i32, mode: i32) -> Self {
        match PitchClass::new(key) {
            Some(pitch_class) => KeySignature::Detected {
                pitch_class,
                mode: Mode::from_flag(mode),
            },
            None => KeySignature::Undetected,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, KeySignature::Detected { .. })
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySignature::Detected { pitch_class, mode } => {
                write!(f, "{} {}", pitch_class.name(), mode.as_str())
            }
            KeySignature::Undetected => f.write_str(NO_KEY_DETECTED),
        }
    }
}
