//! Bible Core - Catalog, reference parsing and verse marker data structures

pub mod canonical;
pub mod catalog;
pub mod markers;
pub mod parser;
pub mod timecode;
pub mod verse;

pub use catalog::{
    Book, Catalog, CatalogBuilder, ChapterAvailability, ChapterKey, Direction, Testament,
};
pub use markers::{
    parse_marker_json, parse_marker_table, ChapterMarkers, LookupMiss, MarkerSource,
    StaticMarkerSource, VerseMarker, VerseMarkerIndex,
};
pub use parser::{ParseError, ParseFailure, ParseResult, Reference, ReferenceParser, Suggestion};
pub use timecode::{format_timecode, parse_timecode};
pub use verse::VerseLabel;

/// Result type for Bible Core operations
pub type Result<T> = std::result::Result<T, BibleCoreError>;

/// Error types for Bible Core operations
#[derive(thiserror::Error, Debug)]
pub enum BibleCoreError {
    #[error("Invalid verse label: {0}")]
    InvalidVerseLabel(String),

    #[error("Invalid time code: {0}")]
    InvalidTimecode(String),

    #[error("Duplicate book in catalog: {0}")]
    DuplicateBook(String),

    #[error("Unknown book: {0}")]
    UnknownBook(String),

    #[error("Verse markers out of order in {key}: {label} at {time}s")]
    MarkersOutOfOrder {
        key: String,
        label: String,
        time: f64,
    },

    #[error("Invalid marker table line {line}: {reason}")]
    InvalidMarkerLine { line: usize, reason: String },

    #[error("Marker source error: {0}")]
    Source(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
