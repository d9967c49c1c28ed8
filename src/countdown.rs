//! Time since the last completed poll, for a countdown display.
//!
//! Measured on tokio's clock, so paused test time drives it too.

use std::time::Duration;

use tokio::time::Instant;

/// Derived countdown towards the next poll.
///
/// Nothing here is authoritative: it only measures the time since
/// [`reset`](PollCountdown::reset) was last called.
///
/// ```
/// use std::time::Duration;
/// use hue_lights_rs::PollCountdown;
/// use tokio::time::Instant;
///
/// let start = Instant::now();
/// let countdown = PollCountdown::starting_at(Duration::from_secs(5), start);
/// let later = start + Duration::from_millis(3200);
/// assert_eq!(countdown.remaining_secs_at(later), 1);
/// assert!(!countdown.is_due_at(later));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PollCountdown {
    interval: Duration,
    last_poll: Instant,
}

impl PollCountdown {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, last_poll: Instant) -> Self {
        PollCountdown { interval, last_poll }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_poll)
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.interval.saturating_sub(self.elapsed_at(now))
    }

    /// Whole seconds left, rounded down.
    pub fn remaining_secs_at(&self, now: Instant) -> u64 {
        self.remaining_at(now).as_secs()
    }

    /// Fraction of the interval that has passed, in `0.0..=1.0`.
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.interval.is_zero() {
            return 1.0;
        }
        (self.elapsed_at(now).as_secs_f32() / self.interval.as_secs_f32()).min(1.0)
    }

    pub fn is_due_at(&self, now: Instant) -> bool {
        self.elapsed_at(now) >= self.interval
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.last_poll = now;
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    pub fn progress(&self) -> f32 {
        self.progress_at(Instant::now())
    }

    pub fn is_due(&self) -> bool {
        self.is_due_at(Instant::now())
    }

    /// A poll just completed.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }
}
