use super::{SeekCommand, VideoPlayer};
use crate::navigation::{ChangeOrigin, NavigationEvent, Navigator, Transition};
use anyhow::Result;
use bible_core::{ChapterKey, LookupMiss};
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts between verse selections and player time
#[derive(Clone)]
pub struct PlaybackBridge {
    player: Arc<dyn VideoPlayer>,
}

impl PlaybackBridge {
    pub fn new(player: Arc<dyn VideoPlayer>) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &Arc<dyn VideoPlayer> {
        &self.player
    }

    /// Verse → time for a user-driven verse change.
    ///
    /// Time-driven and scrub events never produce a seek. An introduction without its own marker
    /// starts at the top of the video.
    pub fn seek_for(&self, navigator: &Navigator, event: &NavigationEvent) -> Option<SeekCommand> {
        let NavigationEvent::VerseSelected {
            book,
            chapter,
            label,
            origin: ChangeOrigin::User(token),
        } = event
        else {
            return None;
        };

        match navigator.markers().time_for(book, *chapter, *label) {
            Ok(time_seconds) => Some(SeekCommand {
                time_seconds,
                token: Some(*token),
            }),
            Err(_) if label.is_intro() => Some(SeekCommand {
                time_seconds: 0.0,
                token: Some(*token),
            }),
            Err(LookupMiss::EmptyChapter) | Err(LookupMiss::UnknownVerse) => {
                warn!("No marker time for {} {}:{}", book.code, chapter, label);
                None
            }
        }
    }

    /// Forward navigation events to the player: chapter changes load the chapter video, user
    /// verse changes seek. Returns the seeks issued.
    pub async fn apply(
        &self,
        navigator: &mut Navigator,
        events: &[NavigationEvent],
    ) -> Result<Vec<SeekCommand>> {
        let mut seeks = Vec::new();

        for event in events {
            if let NavigationEvent::ChapterSelected { book, chapter } = event {
                self.player.load(&ChapterKey::new(book, *chapter)).await?;
                continue;
            }

            if let Some(command) = self.seek_for(navigator, event) {
                debug!("⏩ Seeking to {:.2}s", command.time_seconds);
                self.player.seek(command).await?;
                seeks.push(command);
            } else if let NavigationEvent::VerseSelected {
                origin: ChangeOrigin::User(token),
                ..
            } = event
            {
                // Nothing to wait for
                navigator.confirm_seek(Some(*token));
            }
        }

        Ok(seeks)
    }

    /// Time → verse: sample the player once while it is playing
    pub async fn sample(&self, navigator: &mut Navigator) -> Result<Transition> {
        if !self.player.is_playing().await {
            return Ok(Transition::Unchanged);
        }
        let time_seconds = self.player.current_time().await?;
        Ok(navigator.on_playback_time(time_seconds))
    }
}
