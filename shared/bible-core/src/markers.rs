//! Verse marker index
//!
//! Each chapter video carries an ordered list of `(label, time)` markers. A range label such as
//! "3-5" is one continuous segment covering every verse in the span.

use crate::catalog::{Book, ChapterKey, Direction};
use crate::timecode::parse_timecode;
use crate::verse::VerseLabel;
use crate::{BibleCoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// A verse (or verse range) anchored to a point in the chapter video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseMarker {
    pub label: VerseLabel,
    pub time_seconds: f64,
}

impl VerseMarker {
    pub fn new(label: VerseLabel, time_seconds: f64) -> Self {
        Self {
            label,
            time_seconds,
        }
    }
}

/// Why a marker lookup found nothing
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// The chapter has no markers at all (videos still pending)
    #[error("chapter has no verse markers")]
    EmptyChapter,

    /// Markers exist but none covers the requested verse
    #[error("no marker covers the requested verse")]
    UnknownVerse,
}

/// Validated markers for one chapter, strictly increasing in time
#[derive(Debug, Clone)]
pub struct ChapterMarkers {
    key: ChapterKey,
    markers: Vec<VerseMarker>,
}

impl ChapterMarkers {
    pub fn new(key: ChapterKey, markers: Vec<VerseMarker>) -> Result<Self> {
        let mut previous: Option<f64> = None;
        for marker in &markers {
            let out_of_order = !marker.time_seconds.is_finite()
                || marker.time_seconds < 0.0
                || previous.is_some_and(|p| marker.time_seconds <= p);
            if out_of_order {
                return Err(BibleCoreError::MarkersOutOfOrder {
                    key: key.to_string(),
                    label: marker.label.to_string(),
                    time: marker.time_seconds,
                });
            }
            previous = Some(marker.time_seconds);
        }

        Ok(Self { key, markers })
    }

    pub fn empty(key: ChapterKey) -> Self {
        Self {
            key,
            markers: Vec::new(),
        }
    }

    pub fn key(&self) -> &ChapterKey {
        &self.key
    }

    pub fn markers(&self) -> &[VerseMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn first(&self) -> Option<&VerseMarker> {
        self.markers.first()
    }

    pub fn has_intro(&self) -> bool {
        self.markers.iter().any(|m| m.label.is_intro())
    }

    /// Index of the last marker at or before `time_seconds`
    pub fn index_at(&self, time_seconds: f64) -> Option<usize> {
        let after = self.markers.partition_point(|m| m.time_seconds <= time_seconds);
        after.checked_sub(1)
    }

    /// Closest-preceding-marker rule.
    ///
    /// Before the first marker this is the introduction when the chapter has one, otherwise the
    /// first marker. `None` only for an empty chapter.
    pub fn verse_at(&self, time_seconds: f64) -> Option<VerseLabel> {
        match self.index_at(time_seconds) {
            Some(index) => Some(self.markers[index].label),
            None if self.has_intro() => Some(VerseLabel::INTRO),
            None => self.first().map(|m| m.label),
        }
    }

    /// Marker whose label equals `label`, or whose range contains it when `label` is a bare verse
    pub fn find(&self, label: VerseLabel) -> Option<&VerseMarker> {
        self.position(label).map(|i| &self.markers[i])
    }

    fn position(&self, label: VerseLabel) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.label == label)
            .or_else(|| {
                if label.is_range() || label.is_intro() {
                    return None;
                }
                self.markers
                    .iter()
                    .position(|m| m.label.contains(label.start()))
            })
    }

    pub fn time_for(&self, label: VerseLabel) -> std::result::Result<f64, LookupMiss> {
        if self.is_empty() {
            return Err(LookupMiss::EmptyChapter);
        }
        self.find(label)
            .map(|m| m.time_seconds)
            .ok_or(LookupMiss::UnknownVerse)
    }

    /// The marker before/after the one covering `current`.
    ///
    /// A verse no marker covers steps to the nearest marker on that side of it.
    pub fn neighbor(&self, current: VerseLabel, direction: Direction) -> Option<&VerseMarker> {
        let Some(index) = self.position(current) else {
            return match direction {
                Direction::Previous => self
                    .markers
                    .iter()
                    .rev()
                    .find(|m| m.label.end() < current.start()),
                Direction::Next => self.markers.iter().find(|m| m.label.start() > current.end()),
            };
        };
        match direction {
            Direction::Previous => index.checked_sub(1).map(|i| &self.markers[i]),
            Direction::Next => self.markers.get(index + 1),
        }
    }
}

/// Supplies raw marker lists per chapter
pub trait MarkerSource: Send + Sync {
    /// `Ok(None)` means no marker data exists for the chapter
    fn load(&self, book: &Book, chapter: u32) -> Result<Option<Vec<VerseMarker>>>;
}

/// In-memory marker source
#[derive(Debug, Clone, Default)]
pub struct StaticMarkerSource {
    chapters: HashMap<ChapterKey, Vec<VerseMarker>>,
}

impl StaticMarkerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(mut self, code: &str, chapter: u32, markers: Vec<VerseMarker>) -> Self {
        self.insert(code, chapter, markers);
        self
    }

    pub fn insert(&mut self, code: &str, chapter: u32, markers: Vec<VerseMarker>) {
        let key = ChapterKey {
            book_code: code.trim().to_uppercase(),
            chapter,
        };
        self.chapters.insert(key, markers);
    }
}

impl MarkerSource for StaticMarkerSource {
    fn load(&self, book: &Book, chapter: u32) -> Result<Option<Vec<VerseMarker>>> {
        Ok(self.chapters.get(&ChapterKey::new(book, chapter)).cloned())
    }
}

/// Lazily loaded, per-chapter cache of verse markers.
///
/// Each chapter is loaded from the source at most once; afterwards the markers are shared
/// read-only.
pub struct VerseMarkerIndex {
    source: Arc<dyn MarkerSource>,
    cache: RwLock<HashMap<ChapterKey, Arc<ChapterMarkers>>>,
}

impl VerseMarkerIndex {
    pub fn new(source: Arc<dyn MarkerSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Markers for a chapter, loading on first use.
    ///
    /// A failing source is logged and reported as an empty chapter without being cached, so a
    /// later call retries.
    pub fn markers_for(&self, book: &Book, chapter: u32) -> Arc<ChapterMarkers> {
        match self.try_markers_for(book, chapter) {
            Ok(markers) => markers,
            Err(e) => {
                warn!("Failed to load verse markers for {} {}: {}", book.code, chapter, e);
                Arc::new(ChapterMarkers::empty(ChapterKey::new(book, chapter)))
            }
        }
    }

    pub fn try_markers_for(&self, book: &Book, chapter: u32) -> Result<Arc<ChapterMarkers>> {
        let key = ChapterKey::new(book, chapter);

        if let Some(cached) = self.cached_key(&key) {
            return Ok(cached);
        }

        let markers = match self.source.load(book, chapter)? {
            Some(markers) => ChapterMarkers::new(key.clone(), markers)?,
            None => {
                debug!("No verse markers for {}", key);
                ChapterMarkers::empty(key.clone())
            }
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(key).or_insert_with(|| Arc::new(markers));
        info!("📍 Loaded {} verse markers for {}", entry.len(), entry.key());
        Ok(Arc::clone(entry))
    }

    /// Markers already in the cache, without loading
    pub fn cached(&self, book: &Book, chapter: u32) -> Option<Arc<ChapterMarkers>> {
        self.cached_key(&ChapterKey::new(book, chapter))
    }

    fn cached_key(&self, key: &ChapterKey) -> Option<Arc<ChapterMarkers>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn is_loaded(&self, book: &Book, chapter: u32) -> bool {
        self.cached(book, chapter).is_some()
    }

    /// Load a chapter ahead of use; returns the marker count
    pub fn prefetch(&self, book: &Book, chapter: u32) -> Result<usize> {
        self.try_markers_for(book, chapter).map(|m| m.len())
    }

    pub fn verse_at(&self, book: &Book, chapter: u32, time_seconds: f64) -> Option<VerseLabel> {
        self.markers_for(book, chapter).verse_at(time_seconds)
    }

    pub fn time_for(
        &self,
        book: &Book,
        chapter: u32,
        label: VerseLabel,
    ) -> std::result::Result<f64, LookupMiss> {
        self.markers_for(book, chapter).time_for(label)
    }

    /// Canonical marker label covering `label` (e.g. 32 resolves to "31-33")
    pub fn resolve_label(&self, book: &Book, chapter: u32, label: VerseLabel) -> Option<VerseLabel> {
        self.markers_for(book, chapter).find(label).map(|m| m.label)
    }

    pub fn neighbor(
        &self,
        book: &Book,
        chapter: u32,
        current: VerseLabel,
        direction: Direction,
    ) -> Option<VerseMarker> {
        self.markers_for(book, chapter)
            .neighbor(current, direction)
            .cloned()
    }
}

impl std::fmt::Debug for VerseMarkerIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = self.cache.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("VerseMarkerIndex")
            .field("loaded_chapters", &loaded)
            .finish()
    }
}

/// Parse the `verse,time` marker table format.
///
/// A header row, blank lines and `#` comment lines are skipped; columns past the second are
/// ignored.
pub fn parse_marker_table(content: &str) -> Result<Vec<VerseMarker>> {
    let mut markers = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(',')
            .map(|f| f.trim().trim_matches('"').trim())
            .collect();

        if fields.len() < 2 {
            return Err(BibleCoreError::InvalidMarkerLine {
                line: line_number,
                reason: "expected `verse,time`".to_string(),
            });
        }

        if markers.is_empty() && fields[0].eq_ignore_ascii_case("verse") {
            continue;
        }

        let label = VerseLabel::parse(fields[0]).map_err(|e| BibleCoreError::InvalidMarkerLine {
            line: line_number,
            reason: e.to_string(),
        })?;
        let time_seconds =
            parse_timecode(fields[1]).map_err(|e| BibleCoreError::InvalidMarkerLine {
                line: line_number,
                reason: e.to_string(),
            })?;

        markers.push(VerseMarker::new(label, time_seconds));
    }

    Ok(markers)
}

/// Parse a JSON array of `{ "verse": .., "time": .. }` objects; `time` may be a number of
/// seconds or a time code string
pub fn parse_marker_json(content: &str) -> Result<Vec<VerseMarker>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Seconds(f64),
        Timecode(String),
    }

    #[derive(Deserialize)]
    struct RawMarker {
        #[serde(alias = "label")]
        verse: VerseLabel,
        time: RawTime,
    }

    let raw: Vec<RawMarker> = serde_json::from_str(content)?;
    raw.into_iter()
        .map(|m| {
            let time_seconds = match m.time {
                RawTime::Seconds(seconds) => seconds,
                RawTime::Timecode(code) => parse_timecode(&code)?,
            };
            Ok(VerseMarker::new(m.verse, time_seconds))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn label(text: &str) -> VerseLabel {
        VerseLabel::parse(text).unwrap()
    }

    fn genesis() -> Book {
        Book::new("GEN", "Genesis", 1)
    }

    fn chapter_49() -> ChapterMarkers {
        ChapterMarkers::new(
            ChapterKey::new(&genesis(), 49),
            vec![
                VerseMarker::new(VerseLabel::INTRO, 0.0),
                VerseMarker::new(label("1"), 12.0),
                VerseMarker::new(label("2"), 30.0),
                VerseMarker::new(label("3-5"), 120.0),
                VerseMarker::new(label("6"), 150.0),
                VerseMarker::new(label("31-33"), 310.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn verse_at_uses_closest_preceding_marker() {
        let markers = chapter_49();
        assert_eq!(markers.verse_at(0.0), Some(VerseLabel::INTRO));
        assert_eq!(markers.verse_at(12.0), Some(label("1")));
        assert_eq!(markers.verse_at(29.9), Some(label("1")));
        assert_eq!(markers.verse_at(125.0), Some(label("3-5")));
        assert_eq!(markers.verse_at(10_000.0), Some(label("31-33")));
    }

    #[test]
    fn verse_before_first_marker() {
        let key = ChapterKey::new(&genesis(), 1);
        let without_intro = ChapterMarkers::new(
            key.clone(),
            vec![
                VerseMarker::new(label("1"), 5.0),
                VerseMarker::new(label("2"), 9.0),
            ],
        )
        .unwrap();
        assert_eq!(without_intro.verse_at(1.0), Some(label("1")));

        let with_late_intro = ChapterMarkers::new(
            key.clone(),
            vec![
                VerseMarker::new(VerseLabel::INTRO, 3.0),
                VerseMarker::new(label("1"), 5.0),
            ],
        )
        .unwrap();
        assert_eq!(with_late_intro.verse_at(1.0), Some(VerseLabel::INTRO));

        assert_eq!(ChapterMarkers::empty(key).verse_at(1.0), None);
    }

    #[test]
    fn time_for_resolves_ranges() {
        let markers = chapter_49();
        assert_eq!(markers.time_for(label("4")), Ok(120.0));
        assert_eq!(markers.time_for(label("3_5")), Ok(120.0));
        assert_eq!(markers.time_for(label("32")), Ok(310.5));
        assert_eq!(markers.time_for(label("31-33")), Ok(310.5));
        assert_eq!(markers.time_for(VerseLabel::INTRO), Ok(0.0));
        assert_eq!(markers.time_for(label("20")), Err(LookupMiss::UnknownVerse));
        assert_eq!(markers.time_for(label("4-5")), Err(LookupMiss::UnknownVerse));
    }

    #[test]
    fn empty_chapter_is_distinguishable() {
        let empty = ChapterMarkers::empty(ChapterKey::new(&genesis(), 2));
        assert_eq!(empty.time_for(label("1")), Err(LookupMiss::EmptyChapter));
    }

    #[test]
    fn rejects_non_increasing_markers() {
        let result = ChapterMarkers::new(
            ChapterKey::new(&genesis(), 1),
            vec![
                VerseMarker::new(label("1"), 10.0),
                VerseMarker::new(label("2"), 10.0),
            ],
        );
        assert!(matches!(result, Err(BibleCoreError::MarkersOutOfOrder { .. })));
    }

    #[test]
    fn neighbor_steps_through_markers() {
        let markers = chapter_49();
        assert_eq!(markers.neighbor(label("4"), Direction::Next).unwrap().label, label("6"));
        assert_eq!(
            markers.neighbor(label("6"), Direction::Previous).unwrap().label,
            label("3-5")
        );
        assert!(markers.neighbor(VerseLabel::INTRO, Direction::Previous).is_none());
        assert!(markers.neighbor(label("32"), Direction::Next).is_none());
    }

    #[test]
    fn neighbor_of_uncovered_verse() {
        let markers = chapter_49();
        assert_eq!(markers.neighbor(label("10"), Direction::Next).unwrap().label, label("31-33"));
        assert_eq!(markers.neighbor(label("10"), Direction::Previous).unwrap().label, label("6"));
        assert_eq!(markers.neighbor(label("7-9"), Direction::Previous).unwrap().label, label("6"));
    }

    struct CountingSource {
        inner: StaticMarkerSource,
        loads: AtomicUsize,
    }

    impl MarkerSource for CountingSource {
        fn load(&self, book: &Book, chapter: u32) -> Result<Option<Vec<VerseMarker>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(book, chapter)
        }
    }

    #[test]
    fn index_loads_each_chapter_once() {
        let source = Arc::new(CountingSource {
            inner: StaticMarkerSource::new().with_chapter(
                "GEN",
                49,
                chapter_49().markers().to_vec(),
            ),
            loads: AtomicUsize::new(0),
        });
        let index = VerseMarkerIndex::new(source.clone());
        let book = genesis();

        assert!(!index.is_loaded(&book, 49));
        assert_eq!(index.time_for(&book, 49, label("32")), Ok(310.5));
        assert_eq!(index.verse_at(&book, 49, 125.0), Some(label("3-5")));
        assert_eq!(index.resolve_label(&book, 49, label("32")), Some(label("31-33")));
        assert!(index.is_loaded(&book, 49));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        // Missing chapters are cached as empty
        assert_eq!(index.time_for(&book, 2, label("1")), Err(LookupMiss::EmptyChapter));
        assert_eq!(index.time_for(&book, 2, label("1")), Err(LookupMiss::EmptyChapter));
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn parses_marker_tables() {
        let table = "verse,time\n\nIntro,00:00:00:00\n1,00:00:12:05\n3-5,00:02:00\n# pending\n31_33,05:10.5\n";
        let markers = parse_marker_table(table).unwrap();
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[0].label, VerseLabel::INTRO);
        assert_eq!(markers[1].time_seconds, 12.0);
        assert_eq!(markers[2].label, label("3-5"));
        assert_eq!(markers[3].time_seconds, 310.5);
    }

    #[test]
    fn marker_table_errors_name_the_line() {
        let err = parse_marker_table("verse,time\n1,00:00:01\nfoo,00:00:02\n").unwrap_err();
        assert!(matches!(err, BibleCoreError::InvalidMarkerLine { line: 3, .. }));
    }

    #[test]
    fn parses_marker_json() {
        let json = r#"[{"verse": "Intro", "time": 0}, {"verse": 1, "time": "00:12"}, {"label": "2_3", "time": 20.5}]"#;
        let markers = parse_marker_json(json).unwrap();
        assert_eq!(markers[1].time_seconds, 12.0);
        assert_eq!(markers[2].label, label("2-3"));
    }
}
