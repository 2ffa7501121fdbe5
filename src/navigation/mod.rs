/// Navigation state machine
///
/// The [`Navigator`] owns the single [`Selection`] of a viewing session. Every change goes
/// through one of its transition methods, which report a [`Transition`] and queue
/// [`NavigationEvent`]s for the UI and the playback bridge.

pub mod navigator;

pub use navigator::{Navigator, NavigatorOptions};

use crate::playback::SeekToken;
use bible_core::{Book, ParseError, VerseLabel};
use serde::Serialize;

/// Position in the selection lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NavigationState {
    /// Nothing selected
    Empty,

    /// Book selected, no chapter yet
    BookSelected,

    /// Chapter selected, no verse (or the chapter has no markers)
    ChapterSelected,

    /// Full book/chapter/verse selection
    VerseSelected,
}

/// Current book/chapter/verse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    book: Option<Book>,
    chapter: Option<u32>,
    verse: Option<VerseLabel>,
}

impl Selection {
    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn chapter(&self) -> Option<u32> {
        self.book.as_ref().and(self.chapter)
    }

    pub fn verse(&self) -> Option<VerseLabel> {
        self.chapter().and(self.verse)
    }

    pub fn state(&self) -> NavigationState {
        match (self.book(), self.chapter(), self.verse()) {
            (None, _, _) => NavigationState::Empty,
            (Some(_), None, _) => NavigationState::BookSelected,
            (Some(_), Some(_), None) => NavigationState::ChapterSelected,
            (Some(_), Some(_), Some(_)) => NavigationState::VerseSelected,
        }
    }

    pub(crate) fn set_book(&mut self, book: Book) {
        self.book = Some(book);
        self.chapter = None;
        self.verse = None;
    }

    pub(crate) fn set_chapter(&mut self, chapter: u32) {
        self.chapter = Some(chapter);
        self.verse = None;
    }

    pub(crate) fn set_verse(&mut self, verse: VerseLabel) {
        self.verse = Some(verse);
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.book(), self.chapter(), self.verse()) {
            (None, _, _) => f.write_str("(nothing selected)"),
            (Some(book), None, _) => write!(f, "{}", book),
            (Some(book), Some(chapter), None) => write!(f, "{} {}", book, chapter),
            (Some(book), Some(chapter), Some(verse)) => write!(f, "{} {}:{}", book, chapter, verse),
        }
    }
}

/// What caused a verse change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeOrigin {
    /// Selected by the user (click, search, step); the bridge seeks the player
    User(SeekToken),

    /// The user dragged the seek bar; the player is already there
    Scrub(SeekToken),

    /// Derived from the playback position
    Playback,
}

/// State change notifications
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NavigationEvent {
    BookSelected(Book),
    ChapterSelected {
        book: Book,
        chapter: u32,
    },
    VerseSelected {
        book: Book,
        chapter: u32,
        label: VerseLabel,
        origin: ChangeOrigin,
    },
    PlaybackEnded {
        book: Book,
        chapter: u32,
    },
}

/// Why a transition was refused. The selection is untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("unknown book: {0}")]
    UnknownBook(String),

    #[error("{0} has no videos")]
    BookDisabled(String),

    #[error("no book selected")]
    NoBookSelected,

    #[error("no chapter selected")]
    NoChapterSelected,

    #[error("chapter {chapter} of {book} is not available")]
    ChapterUnavailable { book: String, chapter: u32 },

    #[error("verse {0} has no marker")]
    VerseNotFound(String),

    #[error("no further chapter or verse in that direction")]
    AtBoundary,

    #[error("verse markers could not be loaded in time")]
    MarkersUnavailable,

    #[error("{0}")]
    Invalid(ParseError),
}

/// Outcome of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unchanged,
    Rejected(Rejection),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected(_))
    }

    /// Combine two sequential steps: applied if either applied
    pub(crate) fn then(self, next: Transition) -> Transition {
        match (self, next) {
            (Transition::Applied, _) | (_, Transition::Applied) => Transition::Applied,
            (_, next) => next,
        }
    }
}
