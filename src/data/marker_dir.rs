/// Verse marker files on disk
///
/// One file per chapter video, named after the book and chapter: `Genesis_49.csv` (a
/// `verse,time` table) or `Genesis_49.json`, directly under the root or in any subdirectory.
use bible_core::{parse_marker_json, parse_marker_table, BibleCoreError, Book, MarkerSource, VerseMarker};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const MARKER_EXTENSIONS: [&str; 2] = ["csv", "json"];

/// Marker source backed by a directory of per-chapter files
#[derive(Debug, Clone)]
pub struct DirectoryMarkerSource {
    root: PathBuf,
}

impl DirectoryMarkerSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate file names for a chapter, most specific first
    fn candidates(&self, book: &Book, chapter: u32) -> Vec<String> {
        let mut stems = vec![
            format!("{}_{}", book.display_name, chapter),
            format!("{}_{}", book.display_name.replace(' ', "_"), chapter),
            format!("{}_{}", book.code, chapter),
        ];
        stems.dedup();

        stems
            .iter()
            .flat_map(|stem| MARKER_EXTENSIONS.iter().map(move |ext| format!("{}.{}", stem, ext)))
            .collect()
    }

    /// The chapter's marker file: directly under the root, else anywhere below it
    fn locate(&self, book: &Book, chapter: u32) -> Option<PathBuf> {
        let names = self.candidates(book, chapter);
        if let Some(path) = names.iter().map(|n| self.root.join(n)).find(|p| p.is_file()) {
            return Some(path);
        }

        let mut nested: Vec<(usize, PathBuf)> = WalkDir::new(&self.root)
            .min_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?;
                let rank = names.iter().position(|n| n == name)?;
                Some((rank, entry.into_path()))
            })
            .collect();
        nested.sort();
        nested.into_iter().next().map(|(_, path)| path)
    }
}

impl MarkerSource for DirectoryMarkerSource {
    fn load(&self, book: &Book, chapter: u32) -> bible_core::Result<Option<Vec<VerseMarker>>> {
        let Some(path) = self.locate(book, chapter) else {
            debug!("No marker file for {} {} in {}", book.code, chapter, self.root.display());
            return Ok(None);
        };

        let markers = read_marker_file(&path)?;
        debug!("Read {} markers from {}", markers.len(), path.display());
        Ok(Some(markers))
    }
}

/// Parse one marker file, choosing the format by extension
pub fn read_marker_file(path: &Path) -> bible_core::Result<Vec<VerseMarker>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BibleCoreError::Source(format!("{}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        parse_marker_json(&content)
    } else {
        parse_marker_table(&content)
    }
}

/// A marker file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFile {
    pub path: PathBuf,
    /// Book part of the file name, as written
    pub book: String,
    pub chapter: u32,
}

/// Find every `{Book}_{chapter}.csv|json` file below `root`
pub fn discover_marker_files(root: &Path) -> anyhow::Result<Vec<MarkerFile>> {
    if !root.exists() {
        return Err(anyhow::anyhow!("Markers directory does not exist: {}", root.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_marker_extension(path) {
            continue;
        }

        match parse_file_name(path) {
            Some((book, chapter)) => files.push(MarkerFile {
                path: path.to_path_buf(),
                book,
                chapter,
            }),
            None => warn!("Skipping marker file with unexpected name: {}", path.display()),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn has_marker_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKER_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(e)))
}

fn parse_file_name(path: &Path) -> Option<(String, u32)> {
    let stem = path.file_stem()?.to_str()?;
    let (book, chapter) = stem.rsplit_once('_')?;
    let chapter = chapter.parse().ok()?;
    let book = book.replace('_', " ").trim().to_string();
    (!book.is_empty()).then_some((book, chapter))
}
