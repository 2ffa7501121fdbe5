use super::{ChangeOrigin, NavigationEvent, NavigationState, Rejection, Selection, Transition};
use crate::config::Config;
use crate::playback::{SeekGuard, SeekToken};
use bible_core::{
    Book, Catalog, Direction, ParseResult, Reference, ReferenceParser, VerseLabel,
    VerseMarkerIndex,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Navigator behaviour switches
#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    /// Select the first marker when a chapter is entered
    pub auto_select_first_verse: bool,
    /// Fallback expiry of the manual-seek lock
    pub seek_lock_timeout: Duration,
}

impl NavigatorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auto_select_first_verse: config.navigation.auto_select_first_verse,
            seek_lock_timeout: config.playback.seek_lock_timeout(),
        }
    }
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Single writer of the viewing session's selection
#[derive(Debug)]
pub struct Navigator {
    catalog: Arc<Catalog>,
    markers: Arc<VerseMarkerIndex>,
    selection: Selection,
    guard: SeekGuard,
    events: VecDeque<NavigationEvent>,
    options: NavigatorOptions,
}

impl Navigator {
    pub fn new(
        catalog: Arc<Catalog>,
        markers: Arc<VerseMarkerIndex>,
        options: NavigatorOptions,
    ) -> Self {
        Self {
            catalog,
            markers,
            selection: Selection::default(),
            guard: SeekGuard::new(options.seek_lock_timeout),
            events: VecDeque::new(),
            options,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn markers(&self) -> &Arc<VerseMarkerIndex> {
        &self.markers
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> NavigationState {
        self.selection.state()
    }

    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    /// Seek token the lock is waiting on, if any
    pub fn pending_seek(&self) -> Option<SeekToken> {
        self.guard.pending()
    }

    /// Drain queued events in the order they happened
    pub fn take_events(&mut self) -> Vec<NavigationEvent> {
        self.events.drain(..).collect()
    }

    /// Select a book, clearing chapter and verse
    pub fn select_book(&mut self, book: &Book) -> Transition {
        let Some(book) = self.catalog.book_by_code(&book.code).cloned() else {
            return Transition::Rejected(Rejection::UnknownBook(book.code.clone()));
        };

        if self.catalog.is_book_disabled(&book) {
            debug!("Ignoring disabled book {}", book.code);
            return Transition::Rejected(Rejection::BookDisabled(book.display_name));
        }

        if self.selection.state() == NavigationState::BookSelected
            && self.selection.book() == Some(&book)
        {
            return Transition::Unchanged;
        }

        debug!("Book selected: {}", book);
        self.selection.set_book(book.clone());
        self.events.push_back(NavigationEvent::BookSelected(book));
        Transition::Applied
    }

    /// Select a chapter of the current book, optionally auto-selecting its first verse marker
    pub fn select_chapter(&mut self, chapter: u32, auto_select_first_verse: bool) -> Transition {
        let Some(book) = self.selection.book().cloned() else {
            return Transition::Rejected(Rejection::NoBookSelected);
        };

        if !self.catalog.is_chapter_enabled(&book, chapter) {
            debug!("Rejecting unavailable chapter {} {}", book.code, chapter);
            return Transition::Rejected(Rejection::ChapterUnavailable {
                book: book.display_name,
                chapter,
            });
        }

        if self.selection.chapter() == Some(chapter) {
            return Transition::Unchanged;
        }

        debug!("Chapter selected: {} {}", book, chapter);
        self.selection.set_chapter(chapter);
        self.events.push_back(NavigationEvent::ChapterSelected {
            book: book.clone(),
            chapter,
        });

        if auto_select_first_verse {
            if let Some(first) = self.markers.markers_for(&book, chapter).first() {
                let label = first.label;
                self.select_verse(label);
            }
        }

        Transition::Applied
    }

    /// User selection of a verse; resolves to the covering marker's label, or to the chapter's
    /// verse list when no marker covers it
    pub fn select_verse(&mut self, label: VerseLabel) -> Transition {
        let (book, chapter) = match self.current_chapter() {
            Ok(current) => current,
            Err(rejection) => return Transition::Rejected(rejection),
        };

        let parser = ReferenceParser::new(&self.catalog, &self.markers);
        let Some(resolved) = parser.resolve_verse(&book, chapter, label) else {
            debug!("Rejecting unknown verse {} {}:{}", book.code, chapter, label);
            return Transition::Rejected(Rejection::VerseNotFound(label.to_string()));
        };

        if self.selection.verse() == Some(resolved) {
            return Transition::Unchanged;
        }

        let token = self.guard.arm();
        self.apply_verse(book, chapter, resolved, ChangeOrigin::User(token));
        Transition::Applied
    }

    /// Apply a parsed reference, skipping steps that already match the selection.
    ///
    /// A refused step is returned as the outcome even when earlier steps were applied.
    pub fn resolve_and_jump(&mut self, result: &ParseResult) -> Transition {
        let reference = match result {
            Ok(reference) => reference,
            Err(e) => return Transition::Rejected(Rejection::Invalid(e.clone())),
        };

        info!("🔍 Jumping to {}", reference);
        let Reference {
            book,
            chapter,
            verse,
        } = reference;

        let mut outcome = Transition::Unchanged;

        if self.selection.book() != Some(book) {
            match self.select_book(book) {
                Transition::Rejected(rejection) => return Transition::Rejected(rejection),
                step => outcome = outcome.then(step),
            }
        }

        if self.selection.chapter() != Some(*chapter) {
            let auto_select = verse.is_none() && self.options.auto_select_first_verse;
            match self.select_chapter(*chapter, auto_select) {
                Transition::Rejected(rejection) => return Transition::Rejected(rejection),
                step => outcome = outcome.then(step),
            }
        }

        // Book and chapter events already queued stay queued; the caller still sees the refusal
        if let Some(verse) = verse {
            match self.select_verse(*verse) {
                Transition::Rejected(rejection) => {
                    warn!("Verse {} of {} not selectable: {}", verse, reference, rejection);
                    return Transition::Rejected(rejection);
                }
                step => outcome = outcome.then(step),
            }
        }

        outcome
    }

    /// Adjacent enabled chapter: within the current book first, then the nearest enabled book
    pub fn adjacent_chapter(&self, direction: Direction) -> Option<(Book, u32)> {
        let book = self.selection.book()?;
        let current = self.selection.chapter()?;

        let mut enabled = self.catalog.enabled_chapters(book);
        let within = match direction {
            Direction::Next => enabled.find(|&c| c > current),
            Direction::Previous => enabled.filter(|&c| c < current).last(),
        };
        if let Some(chapter) = within {
            return Some((book.clone(), chapter));
        }

        let next_book = self.catalog.adjacent_book(book, direction)?;
        let chapter = match direction {
            Direction::Next => self.catalog.first_enabled_chapter(next_book),
            Direction::Previous => self.catalog.last_enabled_chapter(next_book),
        }?;
        Some((next_book.clone(), chapter))
    }

    pub fn can_go_previous(&self) -> bool {
        self.adjacent_chapter(Direction::Previous).is_some()
    }

    pub fn can_go_next(&self) -> bool {
        self.adjacent_chapter(Direction::Next).is_some()
    }

    /// Move to the previous/next chapter, crossing book boundaries
    pub fn navigate_chapter(&mut self, direction: Direction) -> Transition {
        let Some((book, chapter)) = self.adjacent_chapter(direction) else {
            debug!("Chapter navigation {:?} at boundary", direction);
            return Transition::Rejected(Rejection::AtBoundary);
        };

        let mut outcome = Transition::Unchanged;
        if self.selection.book() != Some(&book) {
            outcome = outcome.then(self.select_book(&book));
        }
        outcome.then(self.select_chapter(chapter, self.options.auto_select_first_verse))
    }

    /// Time-driven verse update; never touches book or chapter
    pub fn on_playback_time(&mut self, time_seconds: f64) -> Transition {
        let Ok((book, chapter)) = self.current_chapter() else {
            return Transition::Unchanged;
        };

        if self.guard.is_locked() {
            debug!("Playback sample {:.2}s suppressed by seek lock", time_seconds);
            return Transition::Unchanged;
        }

        match self.markers.verse_at(&book, chapter, time_seconds) {
            Some(label) if self.selection.verse() != Some(label) => {
                self.apply_verse(book, chapter, label, ChangeOrigin::Playback);
                Transition::Applied
            }
            _ => Transition::Unchanged,
        }
    }

    /// The user dragged the seek bar to `time_seconds`.
    ///
    /// Arms the seek lock and selects the verse at that time; the player already moved, so the
    /// event carries [`ChangeOrigin::Scrub`].
    pub fn on_user_seek(&mut self, time_seconds: f64) -> (SeekToken, Transition) {
        let token = self.guard.arm();
        let Ok((book, chapter)) = self.current_chapter() else {
            return (token, Transition::Unchanged);
        };

        let transition = match self.markers.verse_at(&book, chapter, time_seconds) {
            Some(label) if self.selection.verse() != Some(label) => {
                self.apply_verse(book, chapter, label, ChangeOrigin::Scrub(token));
                Transition::Applied
            }
            _ => Transition::Unchanged,
        };
        (token, transition)
    }

    /// Player reported a completed seek
    pub fn confirm_seek(&mut self, token: Option<SeekToken>) -> bool {
        self.guard.release(token)
    }

    /// Previous/next verse marker of the current chapter
    pub fn step_verse(&mut self, direction: Direction) -> Transition {
        match self.verse_step_target(direction) {
            Ok(label) => self.select_verse(label),
            Err(rejection) => Transition::Rejected(rejection),
        }
    }

    pub fn can_step_verse(&self, direction: Direction) -> bool {
        self.verse_step_target(direction).is_ok()
    }

    fn verse_step_target(&self, direction: Direction) -> Result<VerseLabel, Rejection> {
        let (book, chapter) = self.current_chapter()?;
        let markers = self.markers.markers_for(&book, chapter);

        let target = match (self.selection.verse(), direction) {
            (Some(current), direction) => markers.neighbor(current, direction),
            (None, Direction::Next) => markers.first(),
            (None, Direction::Previous) => None,
        };
        target.map(|m| m.label).ok_or(Rejection::AtBoundary)
    }

    /// Startup selection: first enabled book and its first enabled chapter
    pub fn select_initial(&mut self) -> Transition {
        let Some(book) = self.catalog.first_enabled_book().cloned() else {
            return Transition::Rejected(Rejection::AtBoundary);
        };
        let Some(chapter) = self.catalog.first_enabled_chapter(&book) else {
            return Transition::Rejected(Rejection::ChapterUnavailable {
                book: book.display_name,
                chapter: 0,
            });
        };

        let outcome = match self.selection.book() {
            Some(current) if *current == book => Transition::Unchanged,
            _ => self.select_book(&book),
        };
        outcome.then(self.select_chapter(chapter, self.options.auto_select_first_verse))
    }

    /// The chapter video reached its end
    pub fn on_playback_ended(&mut self) -> Transition {
        let Ok((book, chapter)) = self.current_chapter() else {
            return Transition::Unchanged;
        };
        info!("🏁 Finished {} {}", book, chapter);
        self.events
            .push_back(NavigationEvent::PlaybackEnded { book, chapter });
        Transition::Applied
    }

    fn current_chapter(&self) -> Result<(Book, u32), Rejection> {
        let book = self.selection.book().ok_or(Rejection::NoBookSelected)?;
        let chapter = self.selection.chapter().ok_or(Rejection::NoChapterSelected)?;
        Ok((book.clone(), chapter))
    }

    fn apply_verse(&mut self, book: Book, chapter: u32, label: VerseLabel, origin: ChangeOrigin) {
        debug!("Verse selected: {} {}:{} ({:?})", book, chapter, label, origin);
        self.selection.set_verse(label);
        self.events.push_back(NavigationEvent::VerseSelected {
            book,
            chapter,
            label,
            origin,
        });
    }
}
