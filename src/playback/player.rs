use super::SeekToken;
use anyhow::Result;
use async_trait::async_trait;
use bible_core::ChapterKey;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Seek request sent to the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeekCommand {
    pub time_seconds: f64,
    /// Echoed back in [`PlayerEvent::SeekCompleted`]
    pub token: Option<SeekToken>,
}

/// Lifecycle events reported by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Played,
    Paused,
    SeekCompleted { token: Option<SeekToken> },
    Ended,
}

/// The external video player
#[async_trait]
pub trait VideoPlayer: Send + Sync {
    /// Load the video of a chapter, positioned at 0
    async fn load(&self, chapter: &ChapterKey) -> Result<()>;
    async fn current_time(&self) -> Result<f64>;
    async fn seek(&self, command: SeekCommand) -> Result<()>;
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn is_playing(&self) -> bool;
}

#[derive(Debug)]
struct PlayerState {
    loaded: Option<ChapterKey>,
    /// Position at `resumed_at`, or the frozen position while paused
    position: f64,
    resumed_at: Option<Instant>,
    duration: Option<f64>,
    seeks: Vec<SeekCommand>,
}

impl PlayerState {
    fn position_at(&self, now: Instant) -> f64 {
        let position = match self.resumed_at {
            Some(resumed) => self.position + now.duration_since(resumed).as_secs_f64(),
            None => self.position,
        };
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

/// In-process player driven by the tokio clock
#[derive(Debug)]
pub struct SimulatedPlayer {
    state: Mutex<PlayerState>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    seek_latency: Duration,
}

impl SimulatedPlayer {
    pub fn new(events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            state: Mutex::new(PlayerState {
                loaded: None,
                position: 0.0,
                resumed_at: None,
                duration: None,
                seeks: Vec::new(),
            }),
            events,
            seek_latency: Duration::ZERO,
        }
    }

    /// Every loaded video is this long; playback ends there
    pub fn with_duration(self, seconds: f64) -> Self {
        self.lock().duration = Some(seconds);
        self
    }

    /// Delay before a seek is confirmed
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    pub fn loaded(&self) -> Option<ChapterKey> {
        self.lock().loaded.clone()
    }

    /// Seeks received so far
    pub fn seeks(&self) -> Vec<SeekCommand> {
        self.lock().seeks.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlayerEvent) {
        if self.events.send(event).is_err() {
            debug!("Player event {:?} dropped, no listener", event);
        }
    }
}

#[async_trait]
impl VideoPlayer for SimulatedPlayer {
    async fn load(&self, chapter: &ChapterKey) -> Result<()> {
        let mut state = self.lock();
        debug!("🎬 Loading video for {}", chapter);
        state.loaded = Some(chapter.clone());
        state.position = 0.0;
        state.resumed_at = state.resumed_at.map(|_| Instant::now());
        Ok(())
    }

    async fn current_time(&self) -> Result<f64> {
        let now = Instant::now();
        let (position, ended) = {
            let mut state = self.lock();
            let position = state.position_at(now);
            let ended = state.resumed_at.is_some()
                && state.duration.is_some_and(|d| position >= d);
            if ended {
                state.position = position;
                state.resumed_at = None;
            }
            (position, ended)
        };

        if ended {
            self.emit(PlayerEvent::Ended);
        }
        Ok(position)
    }

    async fn seek(&self, command: SeekCommand) -> Result<()> {
        {
            let mut state = self.lock();
            state.position = match state.duration {
                Some(duration) => command.time_seconds.clamp(0.0, duration),
                None => command.time_seconds.max(0.0),
            };
            if state.resumed_at.is_some() {
                state.resumed_at = Some(Instant::now());
            }
            state.seeks.push(command);
        }

        let completed = PlayerEvent::SeekCompleted {
            token: command.token,
        };
        if self.seek_latency.is_zero() {
            self.emit(completed);
        } else {
            let events = self.events.clone();
            let latency = self.seek_latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                let _ = events.send(completed);
            });
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        {
            let mut state = self.lock();
            if state.resumed_at.is_some() {
                return Ok(());
            }
            state.resumed_at = Some(Instant::now());
        }
        self.emit(PlayerEvent::Played);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        {
            let mut state = self.lock();
            let now = Instant::now();
            if state.resumed_at.is_none() {
                return Ok(());
            }
            state.position = state.position_at(now);
            state.resumed_at = None;
        }
        self.emit(PlayerEvent::Paused);
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        self.lock().resumed_at.is_some()
    }
}
