/// Viewing session event loop
///
/// One task owns the navigator and multiplexes user commands, player events, the search
/// debounce deadline and the playback poll. User commands are always handled first.
use crate::config::Config;
use crate::navigation::{NavigationEvent, NavigationState, Navigator, Rejection, Transition};
use crate::playback::{PlaybackBridge, PlayerEvent, SeekCommand, VideoPlayer};
use anyhow::Result;
use bible_core::{Book, Direction, ParseError, ReferenceParser, Suggestion, VerseLabel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Requests from the UI
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Book name or code
    SelectBook(String),
    SelectChapter(u32),
    /// Verse label as typed ("5", "3-5", "Intro")
    SelectVerse(String),
    /// Submitted search box text
    Search(String),
    /// Search box keystroke, for typeahead
    SearchInput(String),
    NavigateChapter(Direction),
    StepVerse(Direction),
    /// User dragged the seek bar
    Seek(f64),
    Play,
    Pause,
    Shutdown,
}

/// Notifications to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Navigation(NavigationEvent),
    SearchFailed(ParseError),
    Suggestions(Vec<Suggestion>),
    Seek(SeekCommand),
    Rejected(Rejection),
}

/// Keeps only the latest input and releases it after a quiet period
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending input and restart the quiet period
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the latest input once its quiet period has passed. Never resolves while
    /// nothing is pending. Cancel safe.
    pub async fn ready(&mut self) -> T {
        match &self.pending {
            Some((_, deadline)) => tokio::time::sleep_until(*deadline).await,
            None => std::future::pending::<()>().await,
        }
        match self.pending.take() {
            Some((value, _)) => value,
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionSettings {
    poll_interval: Duration,
    step_timeout: Duration,
    advance_on_end: bool,
    auto_select_first_verse: bool,
    max_suggestions: usize,
}

/// UI side of a running session
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("Session has stopped"))
    }

    pub async fn recv(&mut self) -> Option<SessionUpdate> {
        self.updates.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionUpdate> {
        self.updates.try_recv().ok()
    }

    pub fn commands(&self) -> mpsc::Sender<SessionCommand> {
        self.commands.clone()
    }
}

pub struct Session {
    navigator: Navigator,
    bridge: PlaybackBridge,
    debouncer: Debouncer<String>,
    commands: mpsc::Receiver<SessionCommand>,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    settings: SessionSettings,
    playing: bool,
}

impl Session {
    pub fn new(
        navigator: Navigator,
        player: Arc<dyn VideoPlayer>,
        player_events: mpsc::UnboundedReceiver<PlayerEvent>,
        config: &Config,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let session = Self {
            navigator,
            bridge: PlaybackBridge::new(player),
            debouncer: Debouncer::new(config.search.debounce()),
            commands: command_rx,
            player_events,
            updates: update_tx,
            settings: SessionSettings {
                poll_interval: config.playback.poll_interval(),
                step_timeout: config.navigation.step_timeout(),
                advance_on_end: config.navigation.advance_on_end,
                auto_select_first_verse: config.navigation.auto_select_first_verse,
                max_suggestions: config.search.max_suggestions,
            },
            playing: false,
        };

        let handle = SessionHandle {
            commands: command_tx,
            updates: update_rx,
        };

        (session, handle)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Run until `Shutdown` or until every command sender is gone; returns the navigator
    pub async fn run(mut self) -> Result<Navigator> {
        info!("▶️ Session started");

        if self.navigator.state() == NavigationState::Empty {
            if let Err(e) = self.initialize().await {
                warn!("Initial selection failed: {}", e);
            }
        }

        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let outcome = tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.player_events.recv() => self.handle_player_event(event).await,
                input = self.debouncer.ready() => {
                    self.suggest(&input);
                    Ok(())
                }
                _ = poll.tick(), if self.playing => self.sample().await,
            };

            if let Err(e) = outcome {
                warn!("Session step failed: {}", e);
            }
        }

        info!("⏹️ Session stopped at {}", self.navigator.selection());
        Ok(self.navigator)
    }

    async fn initialize(&mut self) -> Result<()> {
        let first = self.navigator.catalog().first_enabled_book().cloned();
        if let Some(book) = first {
            if let Some(chapter) = self.navigator.catalog().first_enabled_chapter(&book) {
                self.prefetch(&book, chapter).await;
            }
        }
        let transition = self.navigator.select_initial();
        self.finish(transition).await
    }

    async fn handle_command(&mut self, command: SessionCommand) -> Result<()> {
        debug!("Command: {:?}", command);

        let transition = match command {
            SessionCommand::SelectBook(token) => {
                match self.navigator.catalog().lookup_book(&token).cloned() {
                    Some(book) => self.navigator.select_book(&book),
                    None => Transition::Rejected(Rejection::UnknownBook(token)),
                }
            }
            SessionCommand::SelectChapter(chapter) => {
                if let Some(book) = self.navigator.selection().book().cloned() {
                    self.prefetch(&book, chapter).await;
                }
                self.navigator
                    .select_chapter(chapter, self.settings.auto_select_first_verse)
            }
            SessionCommand::SelectVerse(text) => match VerseLabel::parse(&text) {
                Ok(label) => self.navigator.select_verse(label),
                Err(_) => Transition::Rejected(Rejection::VerseNotFound(text)),
            },
            SessionCommand::Search(input) => return self.search(input).await,
            SessionCommand::SearchInput(input) => {
                self.debouncer.push(input);
                return Ok(());
            }
            SessionCommand::NavigateChapter(direction) => self.navigate(direction).await,
            SessionCommand::StepVerse(direction) => self.navigator.step_verse(direction),
            SessionCommand::Seek(time_seconds) => {
                let (token, transition) = self.navigator.on_user_seek(time_seconds);
                let command = SeekCommand {
                    time_seconds,
                    token: Some(token),
                };
                self.bridge.player().seek(command).await?;
                self.publish(SessionUpdate::Seek(command));
                transition
            }
            SessionCommand::Play => {
                self.bridge.player().play().await?;
                return Ok(());
            }
            SessionCommand::Pause => {
                self.bridge.player().pause().await?;
                return Ok(());
            }
            SessionCommand::Shutdown => return Ok(()),
        };

        self.finish(transition).await
    }

    async fn handle_player_event(&mut self, event: PlayerEvent) -> Result<()> {
        debug!("Player event: {:?}", event);

        match event {
            PlayerEvent::Played => self.playing = true,
            PlayerEvent::Paused => self.playing = false,
            PlayerEvent::SeekCompleted { token } => {
                self.navigator.confirm_seek(token);
            }
            PlayerEvent::Ended => {
                self.playing = false;
                let transition = self.navigator.on_playback_ended();
                self.finish(transition).await?;

                if self.settings.advance_on_end {
                    let transition = self.navigate(Direction::Next).await;
                    let advanced = transition.is_applied();
                    self.finish(transition).await?;
                    if advanced {
                        self.bridge.player().play().await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve-and-jump pipeline: parse, wait for the target chapter's markers, then apply
    async fn search(&mut self, input: String) -> Result<()> {
        self.debouncer.cancel();

        let catalog = Arc::clone(self.navigator.catalog());
        let markers = Arc::clone(self.navigator.markers());
        let task = tokio::task::spawn_blocking(move || {
            let result = ReferenceParser::new(&catalog, &markers).parse(&input);
            if let Ok(reference) = &result {
                if let Err(e) = markers.prefetch(&reference.book, reference.chapter) {
                    warn!("Failed to load verse markers for {}: {}", reference, e);
                }
            }
            result
        });

        let result = match tokio::time::timeout(self.settings.step_timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                warn!("⏰ Search timed out waiting for verse markers");
                self.publish(SessionUpdate::Rejected(Rejection::MarkersUnavailable));
                return Ok(());
            }
        };

        if let Err(e) = &result {
            info!("🔍 Search failed: {}", e);
            self.publish(SessionUpdate::SearchFailed(e.clone()));
            return Ok(());
        }

        let transition = self.navigator.resolve_and_jump(&result);
        self.finish(transition).await
    }

    async fn navigate(&mut self, direction: Direction) -> Transition {
        if let Some((book, chapter)) = self.navigator.adjacent_chapter(direction) {
            self.prefetch(&book, chapter).await;
        }
        self.navigator.navigate_chapter(direction)
    }

    async fn sample(&mut self) -> Result<()> {
        let transition = self.bridge.sample(&mut self.navigator).await?;
        self.finish(transition).await
    }

    fn suggest(&self, input: &str) {
        let parser = ReferenceParser::new(self.navigator.catalog(), self.navigator.markers());
        let suggestions = parser.suggest(input, self.settings.max_suggestions);
        debug!("{} suggestions for '{}'", suggestions.len(), input);
        self.publish(SessionUpdate::Suggestions(suggestions));
    }

    /// Load a chapter's markers off the session task, bounded by the step timeout
    async fn prefetch(&self, book: &Book, chapter: u32) -> bool {
        let markers = Arc::clone(self.navigator.markers());
        if markers.is_loaded(book, chapter) {
            return true;
        }

        let target = book.clone();
        let task = tokio::task::spawn_blocking(move || markers.prefetch(&target, chapter));
        match tokio::time::timeout(self.settings.step_timeout, task).await {
            Ok(Ok(Ok(count))) => {
                debug!("Prefetched {} markers for {} {}", count, book.code, chapter);
                true
            }
            Ok(Ok(Err(e))) => {
                warn!("Failed to load verse markers for {} {}: {}", book.code, chapter, e);
                false
            }
            Ok(Err(e)) => {
                warn!("Marker loading task failed: {}", e);
                false
            }
            Err(_) => {
                warn!("⏰ Timed out loading verse markers for {} {}", book.code, chapter);
                false
            }
        }
    }

    /// Report a rejection, publish queued events and forward them to the player
    async fn finish(&mut self, transition: Transition) -> Result<()> {
        if let Transition::Rejected(rejection) = transition {
            debug!("Rejected: {}", rejection);
            self.publish(SessionUpdate::Rejected(rejection));
        }

        let events = self.navigator.take_events();
        if events.is_empty() {
            return Ok(());
        }

        for event in &events {
            self.publish(SessionUpdate::Navigation(event.clone()));
        }

        let seeks = self.bridge.apply(&mut self.navigator, &events).await?;
        for seek in seeks {
            self.publish(SessionUpdate::Seek(seek));
        }
        Ok(())
    }

    fn publish(&self, update: SessionUpdate) {
        if self.updates.send(update).is_err() {
            debug!("Session update dropped, no listener");
        }
    }
}
