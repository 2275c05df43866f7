// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

/// Delay between two frames while visible.
pub const FRAME_DELAY: Duration = Duration::from_millis(5);

/// A cancellable timer holding at most one pending deadline.
///
/// Scheduling replaces whatever was pending, so a second `schedule` can
/// never leave two ticks outstanding.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ticker {
    deadline: Option<Instant>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.cancel();
        self.deadline = Some(now + delay);
    }

    /// Cancelling an idle ticker does nothing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Consumes the pending tick if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending tick, `None` when idle.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
impl Ticker {
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
