//! Identifiers shared by the fixtures.
#![allow(dead_code)]

/// 8B, 80 BPM.
pub const TRACK_C_MAJOR: &str = "4uLU6hMCjMI75M1A2tKUQC";
/// 8B, 158 BPM: half of it is within 10 BPM of 80.
pub const TRACK_DOUBLE_TIME: &str = "7GhIk7Il098yCjg4BQjzvb";
/// 8B, 120 BPM.
pub const TRACK_FAR_TEMPO: &str = "0VjIjW4GlUZAMYd2vXMi3b";
/// 8A, 85 BPM.
pub const TRACK_A_MINOR: &str = "3KkXRkHbMCARz0aVfEt68P";
/// No key detected, 80 BPM.
pub const TRACK_NO_KEY: &str = "1mea3bSkSGXuIRvnydlB5b";
/// The catalog has no features for this one.
pub const TRACK_WITHOUT_FEATURES: &str = "6habFhsOp2NvshLv26DqMb";

pub const PLAYLIST_ID: &str = "37i9dQZF1DXcBWIGoYBM5M";
pub const GENERATED_PLAYLIST_ID: &str = "generated";

/// Length every known track reports, in milliseconds.
pub const TRACK_DURATION_MS: i64 = 200_000;
