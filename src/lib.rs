/// ISL Bible Navigator
///
/// Reference resolution and verse-synchronized navigation for chapter-by-chapter sign language
/// Bible videos. The pure domain (catalog, parser, verse markers) lives in `bible-core`; this
/// crate adds configuration, data loading, the navigation state machine, the playback bridge and
/// the session event loop.

pub mod config;
pub mod data;
pub mod navigation;
pub mod playback;
pub mod session;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::data::{load_catalog, CatalogFile, DirectoryMarkerSource};
pub use crate::navigation::{
    ChangeOrigin, NavigationEvent, NavigationState, Navigator, NavigatorOptions, Rejection,
    Selection, Transition,
};
pub use crate::playback::{
    PlaybackBridge, PlayerEvent, SeekCommand, SeekGuard, SeekToken, SimulatedPlayer, VideoPlayer,
};
pub use crate::session::{Debouncer, Session, SessionCommand, SessionHandle, SessionUpdate};
pub use bible_core;
