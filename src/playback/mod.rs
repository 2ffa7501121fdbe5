/// Playback time bridge
///
/// Connects the navigator's verse selection to the external player's time domain: player time
/// samples become verse updates, user verse changes become seek commands.

pub mod bridge;
pub mod guard;
pub mod player;

pub use bridge::PlaybackBridge;
pub use guard::{GuardState, SeekGuard, SeekToken};
pub use player::{PlayerEvent, SeekCommand, SimulatedPlayer, VideoPlayer};
