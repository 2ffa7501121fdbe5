/// Data loading: the catalog file and per-chapter verse marker files
///
/// Everything here runs once at startup (catalog) or once per chapter (markers); the loaded data
/// is immutable afterwards.

pub mod catalog_file;
pub mod coverage;
pub mod marker_dir;

pub use catalog_file::{load_catalog, BookRecord, CatalogFile, VideoRecord};
pub use coverage::{verse_coverage, VerseCoverage};
pub use marker_dir::{discover_marker_files, read_marker_file, DirectoryMarkerSource, MarkerFile};
