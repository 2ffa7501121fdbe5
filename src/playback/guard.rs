/// Manual-seek lock
///
/// A user-driven verse change arms the guard with a fresh token. While armed, time-driven verse
/// updates are suppressed. The player's seek-completed event releases it; the timeout only
/// covers players that never confirm.
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identifies one user-initiated seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeekToken(u64);

impl SeekToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SeekToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    AwaitingSeekConfirmation { token: SeekToken, expires_at: Instant },
}

#[derive(Debug, Clone)]
pub struct SeekGuard {
    state: GuardState,
    timeout: Duration,
    next_token: u64,
}

impl SeekGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: GuardState::Idle,
            timeout,
            next_token: 1,
        }
    }

    /// Arm the lock for a new seek, superseding any pending one
    pub fn arm(&mut self) -> SeekToken {
        let token = SeekToken(self.next_token);
        self.next_token += 1;
        self.state = GuardState::AwaitingSeekConfirmation {
            token,
            expires_at: Instant::now() + self.timeout,
        };
        debug!("Seek lock armed {}", token);
        token
    }

    /// Whether time-driven updates must be suppressed right now.
    ///
    /// An expired lock falls back to `Idle`.
    pub fn is_locked(&mut self) -> bool {
        match self.state {
            GuardState::Idle => false,
            GuardState::AwaitingSeekConfirmation { token, expires_at } => {
                if Instant::now() >= expires_at {
                    debug!("Seek lock {} expired without confirmation", token);
                    self.state = GuardState::Idle;
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Release on seek completion.
    ///
    /// `Some(token)` must match the pending seek; a confirmation for a superseded seek is
    /// ignored. `None` is a seek the player started itself and releases whatever is pending.
    pub fn release(&mut self, confirmed: Option<SeekToken>) -> bool {
        match self.state {
            GuardState::AwaitingSeekConfirmation { token, .. }
                if confirmed.map_or(true, |c| c == token) =>
            {
                debug!("Seek lock released {}", token);
                self.state = GuardState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<SeekToken> {
        match self.state {
            GuardState::Idle => None,
            GuardState::AwaitingSeekConfirmation { token, .. } => Some(token),
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }
}
