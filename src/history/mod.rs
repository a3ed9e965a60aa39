//! Streaming history normalization.
//!
//! Turns exported streaming-history documents into canonical
//! [`StreamEvent`]s and splits them into music plays and podcast episodes.

mod models;
mod normalize;
mod raw;

pub use models::{CalendarFields, MusicEvent, PlaybackInfo, PodcastEvent, StreamEvent};
pub use normalize::{
    get_podcasts, ms_to_secs, normalize, partition, remove_podcasts, NormalizeReport,
    NormalizedHistory,
};
pub use raw::{load_export_documents, ExportDocument, HistoryError, RawStreamRecord};
