//! Free-text reference parser
//!
//! Turns "John 3:16", "1 Tim 2", "psa 1" or "gen 49:3-5" into a validated book/chapter/verse
//! reference. Syntax is checked before the book is looked up, so a malformed string is never
//! reported as a missing book.

use crate::catalog::{Book, Catalog};
use crate::markers::VerseMarkerIndex;
use crate::verse::{VerseLabel, INTRO_LABEL};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Bare failure kind, for callers that only branch on the category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParseFailure {
    EmptyInput,
    Malformed,
    BookNotFound,
    ChapterUnavailable,
    VerseNotFound,
}

/// Why a reference could not be resolved. Returned as data, never fatal.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty reference")]
    EmptyInput,

    #[error("malformed reference: {0}")]
    Malformed(String),

    #[error("book not found: {0}")]
    BookNotFound(String),

    #[error("{book} has no available chapter {chapter}")]
    ChapterUnavailable { book: String, chapter: u32 },

    #[error("{book} {chapter} has no verse {verse}")]
    VerseNotFound {
        book: String,
        chapter: u32,
        verse: VerseLabel,
    },
}

impl ParseError {
    pub fn kind(&self) -> ParseFailure {
        match self {
            ParseError::EmptyInput => ParseFailure::EmptyInput,
            ParseError::Malformed(_) => ParseFailure::Malformed,
            ParseError::BookNotFound(_) => ParseFailure::BookNotFound,
            ParseError::ChapterUnavailable { .. } => ParseFailure::ChapterUnavailable,
            ParseError::VerseNotFound { .. } => ParseFailure::VerseNotFound,
        }
    }

    /// Message shown under the search box
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ParseFailure::EmptyInput | ParseFailure::Malformed => {
                "Invalid format use the following format John 3:16 or psa 1"
            }
            ParseFailure::BookNotFound => "Book not found",
            ParseFailure::ChapterUnavailable => "Chapter not found",
            ParseFailure::VerseNotFound => "Verse not found",
        }
    }
}

/// A validated book/chapter/verse triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub book: Book,
    /// 0 is the introduction
    pub chapter: u32,
    pub verse: Option<VerseLabel>,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book.display_name, self.chapter)?;
        if let Some(verse) = self.verse {
            write!(f, ":{}", verse)?;
        }
        Ok(())
    }
}

pub type ParseResult = std::result::Result<Reference, ParseError>;

/// A typeahead candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub book: Book,
    pub disabled: bool,
}

/// Syntactic split of the input before any catalog lookup
#[derive(Debug, PartialEq, Eq)]
struct RawReference {
    book: String,
    chapter: u32,
    verse: Option<VerseLabel>,
}

fn colon_spacing() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*:\s*").ok()).as_ref()
}

/// Parses references against a catalog and marker index
#[derive(Debug, Clone, Copy)]
pub struct ReferenceParser<'a> {
    catalog: &'a Catalog,
    markers: &'a VerseMarkerIndex,
}

impl<'a> ReferenceParser<'a> {
    pub fn new(catalog: &'a Catalog, markers: &'a VerseMarkerIndex) -> Self {
        Self { catalog, markers }
    }

    pub fn parse(&self, input: &str) -> ParseResult {
        let raw = split_reference(input)?;

        let book = self
            .catalog
            .lookup_book(&raw.book)
            .ok_or_else(|| ParseError::BookNotFound(raw.book.clone()))?;

        if !self.catalog.is_chapter_enabled(book, raw.chapter) {
            return Err(ParseError::ChapterUnavailable {
                book: book.display_name.clone(),
                chapter: raw.chapter,
            });
        }

        if let Some(verse) = raw.verse {
            if self.resolve_verse(book, raw.chapter, verse).is_none() {
                return Err(ParseError::VerseNotFound {
                    book: book.display_name.clone(),
                    chapter: raw.chapter,
                    verse,
                });
            }
        }

        let reference = Reference {
            book: book.clone(),
            chapter: raw.chapter,
            verse: raw.verse,
        };
        debug!("Parsed '{}' as {}", input.trim(), reference);
        Ok(reference)
    }

    /// Label to select for `verse` in a chapter, or `None` when the chapter has no such verse.
    ///
    /// The introduction is always playable in an enabled chapter. A marker matching exactly or
    /// covering the first verse gives its own label; otherwise the chapter's verse list must
    /// name the verse or contain its first verse. Ranges running past the chapter's last verse
    /// never resolve.
    pub fn resolve_verse(
        &self,
        book: &Book,
        chapter: u32,
        verse: VerseLabel,
    ) -> Option<VerseLabel> {
        let markers = self.markers.markers_for(book, chapter);
        if verse.is_intro() {
            return Some(markers.find(verse).map_or(VerseLabel::INTRO, |m| m.label));
        }

        let listed = self.catalog.list_verses(book, chapter);
        let last_verse = listed
            .iter()
            .chain(markers.markers().iter().map(|m| &m.label))
            .map(VerseLabel::end)
            .max()?;
        if verse.end() > last_verse {
            return None;
        }

        let first = VerseLabel::single(verse.start());
        if let Some(marker) = markers.find(verse).or_else(|| markers.find(first)) {
            return Some(marker.label);
        }

        listed
            .iter()
            .find(|v| **v == verse)
            .or_else(|| listed.iter().find(|v| v.contains(verse.start())))
            .copied()
    }

    /// Books whose name, code or alias starts with the book fragment of `input`.
    ///
    /// Enabled books come first; within each group the catalog order is kept.
    pub fn suggest(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        let fragment = book_fragment(input);
        if fragment.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<Suggestion> = self
            .catalog
            .books()
            .filter(|book| {
                book.display_name.to_lowercase().starts_with(&fragment)
                    || book.code.to_lowercase().starts_with(&fragment)
                    || self
                        .catalog
                        .aliases(book)
                        .iter()
                        .any(|a| a.to_lowercase().starts_with(&fragment))
            })
            .map(|book| Suggestion {
                book: book.clone(),
                disabled: self.catalog.is_book_disabled(book),
            })
            .collect();

        matches.sort_by_key(|s| s.disabled);
        matches.truncate(limit);
        matches
    }
}

/// Leading tokens up to the first numeric token after the start, lowercased
fn book_fragment(input: &str) -> String {
    let before_colon = input.split(':').next().unwrap_or_default();
    before_colon
        .split_whitespace()
        .enumerate()
        .take_while(|(i, token)| *i == 0 || !is_numeric(token))
        .map(|(_, token)| token)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn split_reference(input: &str) -> Result<RawReference, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let malformed = || ParseError::Malformed(trimmed.to_string());

    if trimmed.contains(':') {
        let normalized = match colon_spacing() {
            Some(pattern) => pattern.replace_all(trimmed, ":").into_owned(),
            None => trimmed.to_string(),
        };

        let parts: Vec<&str> = normalized.split(':').collect();
        let [left, right] = parts.as_slice() else {
            return Err(malformed());
        };

        let left: Vec<&str> = left.split_whitespace().collect();
        let right = right.trim();
        if left.len() < 2 || right.is_empty() || right.contains(char::is_whitespace) {
            return Err(malformed());
        }

        let (chapter, book) = left.split_last().ok_or_else(malformed)?;
        return Ok(RawReference {
            book: book.join(" "),
            chapter: parse_chapter(chapter).ok_or_else(malformed)?,
            verse: Some(VerseLabel::parse(right).map_err(|_| malformed())?),
        });
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let numbered_book = tokens.len() >= 3 && is_numeric(tokens[0]) && !is_numeric(tokens[1]);

    let (book, chapter, verse) = match (tokens.as_slice(), numbered_book) {
        ([book, chapter], _) => (book.to_string(), *chapter, None),
        ([number, name, chapter], true) => (format!("{} {}", number, name), *chapter, None),
        ([book, chapter, verse], false) => (book.to_string(), *chapter, Some(*verse)),
        ([number, name, chapter, verse], true) => {
            (format!("{} {}", number, name), *chapter, Some(*verse))
        }
        _ => return Err(malformed()),
    };

    Ok(RawReference {
        book,
        chapter: parse_chapter(chapter).ok_or_else(malformed)?,
        verse: verse
            .map(|v| VerseLabel::parse(v).map_err(|_| malformed()))
            .transpose()?,
    })
}

fn parse_chapter(token: &str) -> Option<u32> {
    if token.eq_ignore_ascii_case(INTRO_LABEL) {
        return Some(0);
    }
    if !is_numeric(token) {
        return None;
    }
    token.parse().ok()
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
