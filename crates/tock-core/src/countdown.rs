//! Fixed-duration countdown with a single completion event.

use crate::format;
use crate::types::ValidationError;

/// Countdown tick cadence.
pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;

const MAX_HOURS: i64 = 23;
const MAX_MINUTES: i64 = 59;
const MAX_SECONDS: i64 = 59;

/// Emitted by [`CountdownTimer::tick`] on the tick that reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub total_ms: u64,
}

/// Countdown state.
///
/// `remaining_ms` only moves through [`CountdownTimer::tick`], one whole second
/// at a time, and never below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountdownTimer {
    total_ms: u64,
    remaining_ms: u64,
    running: bool,
    finished: bool,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duration. Each field is clamped to its clock range first
    /// (hours 0-23, minutes and seconds 0-59).
    ///
    /// Only allowed while stopped with nothing remaining, i.e. fresh, finished,
    /// or reset. A zero total is rejected.
    pub fn configure(&mut self, hours: i64, minutes: i64, seconds: i64) -> Result<u64, ValidationError> {
        if self.running || self.remaining_ms > 0 {
            return Err(ValidationError::CountdownActive);
        }
        let hours = hours.clamp(0, MAX_HOURS).unsigned_abs();
        let minutes = minutes.clamp(0, MAX_MINUTES).unsigned_abs();
        let seconds = seconds.clamp(0, MAX_SECONDS).unsigned_abs();
        let total_seconds = hours * 3600 + minutes * 60 + seconds;
        if total_seconds == 0 {
            return Err(ValidationError::ZeroDuration);
        }

        self.total_ms = total_seconds * 1000;
        self.remaining_ms = self.total_ms;
        self.finished = false;
        tracing::debug!(total_ms = self.total_ms, "countdown configured");
        Ok(self.total_ms)
    }

    /// Starts or resumes. Restarts from the full duration after a finish.
    ///
    /// Returns `false` when nothing is configured.
    pub fn start(&mut self) -> bool {
        if self.total_ms == 0 {
            return false;
        }
        if self.remaining_ms == 0 {
            self.remaining_ms = self.total_ms;
            self.finished = false;
        }
        self.running = true;
        tracing::debug!(remaining_ms = self.remaining_ms, "countdown started");
        true
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            tracing::debug!(remaining_ms = self.remaining_ms, "countdown paused");
        }
    }

    /// Removes one second. The tick that reaches zero stops the countdown and
    /// returns the completion event.
    pub fn tick(&mut self) -> Option<Finished> {
        if !self.running || self.remaining_ms == 0 {
            return None;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(COUNTDOWN_INTERVAL_MS);
        if self.remaining_ms > 0 {
            return None;
        }
        self.running = false;
        self.finished = true;
        tracing::debug!(total_ms = self.total_ms, "countdown finished");
        Some(Finished {
            total_ms: self.total_ms,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::debug!("countdown reset");
    }

    pub const fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub const fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// `HH:MM:SS` of the remaining time.
    pub fn format_display(&self) -> String {
        format::countdown(self.remaining_ms)
    }

    /// Share of the configured duration already elapsed, in `[0, 100]`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "durations are capped below 24h, well inside f64 precision"
    )]
    pub fn progress_percent(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        let elapsed = self.total_ms - self.remaining_ms;
        elapsed as f64 / self.total_ms as f64 * 100.0
    }
}
