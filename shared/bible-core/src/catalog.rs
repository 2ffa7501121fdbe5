//! Book / chapter / verse availability catalog
//!
//! Immutable once built. Chapter 0 is the introduction pseudo-chapter and is only listed when
//! a video exists for it.

use crate::canonical::{self, LAST_OLD_TESTAMENT_ID};
use crate::verse::VerseLabel;
use crate::{BibleCoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

/// A canonical book
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    /// Short code, e.g. "GEN"
    pub code: String,
    /// Name shown in the UI, e.g. "Genesis"
    pub display_name: String,
    /// Canonical position; <= 39 is Old Testament
    pub numeric_id: u32,
    /// Cover image shown next to the book
    pub image_path: Option<String>,
}

impl Book {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, numeric_id: u32) -> Self {
        Self {
            code: code.into().to_uppercase(),
            display_name: display_name.into(),
            numeric_id,
            image_path: None,
        }
    }

    pub fn testament(&self) -> Testament {
        if self.numeric_id <= LAST_OLD_TESTAMENT_ID {
            Testament::Old
        } else {
            Testament::New
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Testament {
    Old,
    New,
}

/// Traversal direction for chapter, book and verse stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Previous,
    Next,
}

/// One chapter of a book and whether it has video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterAvailability {
    pub number: u32,
    pub disabled: bool,
}

impl ChapterAvailability {
    pub fn is_intro(&self) -> bool {
        self.number == 0
    }
}

/// Cache key for per-chapter data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterKey {
    pub book_code: String,
    pub chapter: u32,
}

impl ChapterKey {
    pub fn new(book: &Book, chapter: u32) -> Self {
        Self {
            book_code: book.code.clone(),
            chapter,
        }
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book_code, self.chapter)
    }
}

#[derive(Debug, Clone)]
struct BookEntry {
    book: Book,
    chapters: Vec<ChapterAvailability>,
    aliases: Vec<String>,
    disabled: bool,
}

/// Immutable availability index
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<BookEntry>,
    by_code: HashMap<String, usize>,
    verses: HashMap<ChapterKey, Vec<VerseLabel>>,
}

impl Catalog {
    /// Start building a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Resolve a user token to a book.
    ///
    /// Exact, case-insensitive matching only: display name first, then code, then the book's
    /// alternative names. Internal whitespace is collapsed before comparing.
    pub fn lookup_book(&self, token: &str) -> Option<&Book> {
        let needle = normalize_token(token);
        if needle.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|e| e.book.display_name.to_lowercase() == needle)
            .or_else(|| self.entries.iter().find(|e| e.book.code.to_lowercase() == needle))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.aliases.iter().any(|a| a.to_lowercase() == needle))
            })
            .map(|e| &e.book)
    }

    /// All books in canonical order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.entries.iter().map(|e| &e.book)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn book_by_code(&self, code: &str) -> Option<&Book> {
        self.entry(code).map(|e| &e.book)
    }

    /// Alternative names registered for a book
    pub fn aliases(&self, book: &Book) -> &[String] {
        self.entry(&book.code).map(|e| e.aliases.as_slice()).unwrap_or(&[])
    }

    /// A book with no enabled chapter is disabled
    pub fn is_book_disabled(&self, book: &Book) -> bool {
        self.entry(&book.code).map_or(true, |e| e.disabled)
    }

    /// Ordered chapter list for a book (empty for unknown books)
    pub fn list_chapters(&self, book: &Book) -> &[ChapterAvailability] {
        self.entry(&book.code).map(|e| e.chapters.as_slice()).unwrap_or(&[])
    }

    pub fn chapter(&self, book: &Book, number: u32) -> Option<ChapterAvailability> {
        self.list_chapters(book)
            .iter()
            .find(|c| c.number == number)
            .copied()
    }

    pub fn is_chapter_enabled(&self, book: &Book, number: u32) -> bool {
        self.chapter(book, number).is_some_and(|c| !c.disabled)
    }

    pub fn enabled_chapters<'a>(&'a self, book: &Book) -> impl Iterator<Item = u32> + 'a {
        self.list_chapters(book)
            .iter()
            .filter(|c| !c.disabled)
            .map(|c| c.number)
    }

    pub fn first_enabled_chapter(&self, book: &Book) -> Option<u32> {
        self.enabled_chapters(book).next()
    }

    pub fn last_enabled_chapter(&self, book: &Book) -> Option<u32> {
        self.enabled_chapters(book).last()
    }

    /// Verse labels listed for a chapter (empty when none are known)
    pub fn list_verses(&self, book: &Book, chapter: u32) -> &[VerseLabel] {
        self.verses
            .get(&ChapterKey::new(book, chapter))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Catalog position of a book
    pub fn position(&self, book: &Book) -> Option<usize> {
        self.by_code.get(&book.code.to_uppercase()).copied()
    }

    pub fn first_enabled_book(&self) -> Option<&Book> {
        self.entries.iter().find(|e| !e.disabled).map(|e| &e.book)
    }

    pub fn last_enabled_book(&self) -> Option<&Book> {
        self.entries.iter().rev().find(|e| !e.disabled).map(|e| &e.book)
    }

    /// Nearest enabled book before/after `book` in catalog order
    pub fn adjacent_book(&self, book: &Book, direction: Direction) -> Option<&Book> {
        let position = self.position(book)?;
        match direction {
            Direction::Previous => self.entries[..position]
                .iter()
                .rev()
                .find(|e| !e.disabled)
                .map(|e| &e.book),
            Direction::Next => self.entries[position + 1..]
                .iter()
                .find(|e| !e.disabled)
                .map(|e| &e.book),
        }
    }

    fn entry(&self, code: &str) -> Option<&BookEntry> {
        self.by_code
            .get(&code.trim().to_uppercase())
            .map(|&i| &self.entries[i])
    }
}

fn normalize_token(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct PendingBook {
    book: Book,
    chapter_count: u32,
    aliases: Vec<String>,
}

/// Assembles a [`Catalog`] from book rows, video availability and verse lists
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    books: Vec<PendingBook>,
    videos: BTreeSet<ChapterKey>,
    verses: HashMap<ChapterKey, Vec<VerseLabel>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-populated with the 66 canonical books (no chapter enabled yet)
    pub fn canonical() -> Self {
        let mut builder = Self::new();
        for row in canonical::BOOKS.iter() {
            builder = builder.add_book(
                Book::new(row.code, row.name, row.numeric_id),
                row.chapters,
                row.aliases.iter().map(|a| a.to_string()).collect(),
            );
        }
        builder
    }

    pub fn add_book(mut self, book: Book, chapter_count: u32, aliases: Vec<String>) -> Self {
        self.books.push(PendingBook {
            book,
            chapter_count,
            aliases,
        });
        self
    }

    /// Attach a cover image to an already added book
    pub fn with_image(mut self, code: &str, image_path: impl Into<String>) -> Self {
        let image_path = image_path.into();
        if let Some(pending) = self
            .books
            .iter_mut()
            .find(|p| p.book.code.eq_ignore_ascii_case(code))
        {
            pending.book.image_path = Some(image_path);
        }
        self
    }

    /// Mark a chapter as having video
    pub fn enable_chapter(mut self, code: &str, chapter: u32) -> Self {
        self.videos.insert(key(code, chapter));
        self
    }

    pub fn enable_chapters(mut self, code: &str, chapters: impl IntoIterator<Item = u32>) -> Self {
        for chapter in chapters {
            self.videos.insert(key(code, chapter));
        }
        self
    }

    /// List verses `1..=count` for a chapter
    pub fn verse_count(self, code: &str, chapter: u32, count: u32) -> Self {
        self.verse_labels(code, chapter, (1..=count).map(VerseLabel::single))
    }

    pub fn verse_labels(
        mut self,
        code: &str,
        chapter: u32,
        labels: impl IntoIterator<Item = VerseLabel>,
    ) -> Self {
        let mut labels: Vec<VerseLabel> = labels.into_iter().collect();
        labels.sort();
        labels.dedup();
        self.verses.insert(key(code, chapter), labels);
        self
    }

    pub fn build(self) -> Result<Catalog> {
        let mut pending = self.books;
        pending.sort_by_key(|p| p.book.numeric_id);

        let mut entries = Vec::with_capacity(pending.len());
        let mut by_code = HashMap::new();
        let mut seen_ids = BTreeSet::new();

        for mut p in pending {
            p.book.code = p.book.code.trim().to_uppercase();
            if !seen_ids.insert(p.book.numeric_id) {
                return Err(BibleCoreError::DuplicateBook(format!(
                    "{} (id {})",
                    p.book.code, p.book.numeric_id
                )));
            }
            if by_code.insert(p.book.code.clone(), entries.len()).is_some() {
                return Err(BibleCoreError::DuplicateBook(p.book.code.clone()));
            }

            let mut chapters: Vec<ChapterAvailability> = (1..=p.chapter_count)
                .map(|number| ChapterAvailability {
                    number,
                    disabled: !self.videos.contains(&ChapterKey::new(&p.book, number)),
                })
                .collect();

            if self.videos.contains(&ChapterKey::new(&p.book, 0)) {
                chapters.insert(
                    0,
                    ChapterAvailability {
                        number: 0,
                        disabled: false,
                    },
                );
            }

            let disabled = chapters.iter().all(|c| c.disabled);
            entries.push(BookEntry {
                book: p.book,
                chapters,
                aliases: p.aliases,
                disabled,
            });
        }

        for video in &self.videos {
            if !by_code.contains_key(&video.book_code) {
                return Err(BibleCoreError::UnknownBook(video.book_code.clone()));
            }
            debug!("Video available for {}", video);
        }

        let enabled_books = entries.iter().filter(|e| !e.disabled).count();
        info!(
            "📚 Catalog built: {} books ({} with video), {} chapters with video",
            entries.len(),
            enabled_books,
            self.videos.len()
        );

        Ok(Catalog {
            entries,
            by_code,
            verses: self.verses,
        })
    }
}

fn key(code: &str, chapter: u32) -> ChapterKey {
    ChapterKey {
        book_code: code.trim().to_uppercase(),
        chapter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        CatalogBuilder::canonical()
            .enable_chapters("GEN", [1, 2, 49])
            .enable_chapter("GEN", 0)
            .enable_chapters("JHN", [3])
            .enable_chapters("1JN", [2])
            .verse_count("GEN", 49, 33)
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_matches_name_code_and_alias() {
        let catalog = sample();
        assert_eq!(catalog.lookup_book("genesis").unwrap().code, "GEN");
        assert_eq!(catalog.lookup_book("GEN").unwrap().code, "GEN");
        assert_eq!(catalog.lookup_book("1  john").unwrap().code, "1JN");
        assert_eq!(catalog.lookup_book("1jn").unwrap().code, "1JN");
        assert_eq!(catalog.lookup_book("psalm").unwrap().code, "PSA");
        assert!(catalog.lookup_book("gene").is_none());
        assert!(catalog.lookup_book("").is_none());
    }

    #[test]
    fn chapters_without_video_are_disabled() {
        let catalog = sample();
        let genesis = catalog.book_by_code("GEN").unwrap();
        let chapters = catalog.list_chapters(genesis);
        assert_eq!(chapters.len(), 51);
        assert_eq!(chapters[0], ChapterAvailability { number: 0, disabled: false });
        assert!(!catalog.chapter(genesis, 1).unwrap().disabled);
        assert!(catalog.chapter(genesis, 3).unwrap().disabled);
        assert!(catalog.chapter(genesis, 999).is_none());
        assert_eq!(
            catalog.enabled_chapters(genesis).collect::<Vec<_>>(),
            vec![0, 1, 2, 49]
        );
    }

    #[test]
    fn books_without_video_are_disabled() {
        let catalog = sample();
        let exodus = catalog.book_by_code("EXO").unwrap();
        assert!(catalog.is_book_disabled(exodus));
        assert!(!catalog.is_book_disabled(catalog.book_by_code("JHN").unwrap()));
    }

    #[test]
    fn adjacent_book_skips_disabled_books() {
        let catalog = sample();
        let genesis = catalog.book_by_code("GEN").unwrap();
        let john = catalog.book_by_code("JHN").unwrap();
        assert_eq!(catalog.adjacent_book(genesis, Direction::Next).unwrap().code, "JHN");
        assert_eq!(catalog.adjacent_book(john, Direction::Previous).unwrap().code, "GEN");
        assert!(catalog.adjacent_book(genesis, Direction::Previous).is_none());
        assert_eq!(catalog.first_enabled_book().unwrap().code, "GEN");
        assert_eq!(catalog.last_enabled_book().unwrap().code, "1JN");
    }

    #[test]
    fn testament_partition() {
        let catalog = sample();
        assert_eq!(catalog.book_by_code("MAL").unwrap().testament(), Testament::Old);
        assert_eq!(catalog.book_by_code("MAT").unwrap().testament(), Testament::New);
    }

    #[test]
    fn duplicate_books_are_rejected() {
        let result = CatalogBuilder::new()
            .add_book(Book::new("GEN", "Genesis", 1), 50, Vec::new())
            .add_book(Book::new("GEN", "Genesis again", 2), 50, Vec::new())
            .build();
        assert!(matches!(result, Err(BibleCoreError::DuplicateBook(_))));
    }

    #[test]
    fn videos_for_unknown_books_are_rejected() {
        let result = CatalogBuilder::new()
            .add_book(Book::new("GEN", "Genesis", 1), 50, Vec::new())
            .enable_chapter("XYZ", 1)
            .build();
        assert!(matches!(result, Err(BibleCoreError::UnknownBook(_))));
    }

    #[test]
    fn verse_lists_are_sorted() {
        let catalog = sample();
        let genesis = catalog.book_by_code("GEN").unwrap();
        let verses = catalog.list_verses(genesis, 49);
        assert_eq!(verses.len(), 33);
        assert_eq!(verses[0], VerseLabel::single(1));
        assert!(catalog.list_verses(genesis, 1).is_empty());
    }
}
