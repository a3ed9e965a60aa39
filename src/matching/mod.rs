//! Compatibility queries over enriched tables.

mod engine;
mod query;

pub use engine::{find_compatible, tempo_matches, CompatibilityResult, Matchable};
pub use query::{CompatibilityQuery, MatchError, Selector};
