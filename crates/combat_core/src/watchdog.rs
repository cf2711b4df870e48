//! Detects move decisions that make no progress.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveVerdict {
    Continue,
    /// The agent has been standing still for too long; give up the move.
    Abort,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveWatchdog {
    stopped_since: Option<Duration>,
}

impl MoveWatchdog {
    /// Feeds one observation. The move is aborted once the agent has been
    /// still for strictly longer than `abort_after`.
    pub fn observe(&mut self, now: Duration, is_moving: bool, abort_after: Duration) -> MoveVerdict {
        if is_moving {
            self.stopped_since = None;
            return MoveVerdict::Continue;
        }
        let since = *self.stopped_since.get_or_insert(now);
        if now.saturating_sub(since) > abort_after {
            MoveVerdict::Abort
        } else {
            MoveVerdict::Continue
        }
    }

    pub fn reset(&mut self) {
        self.stopped_since = None;
    }

    pub fn stopped_since(&self) -> Option<Duration> {
        self.stopped_since
    }
}
