//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{fake_adapter, track_id, FakeCatalog, TRACK_C_MAJOR};
//!
//! #[test]
//! fn test_fetch() {
//!     let adapter = fake_adapter(FakeCatalog::with_known_tracks());
//!     let features = adapter.fetch_audio_features(&[track_id(TRACK_C_MAJOR)]).unwrap();
//!     assert_eq!(features.len(), 1);
//! }
//! ```

mod constants;
mod fake_catalog;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fake_catalog::{fake_adapter, FakeCatalog};
#[allow(unused_imports)]
pub use fixtures::{generated_playlist, track_id, write_history_dir, HISTORY_SKIPPED_RECORDS};
