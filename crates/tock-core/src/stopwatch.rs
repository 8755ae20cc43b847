//! Elapsed-time accumulation with lap snapshots.

use serde::{Deserialize, Serialize};

use crate::format;

/// Stopwatch tick cadence fine enough for hundredths-of-a-second display.
pub const STOPWATCH_INTERVAL_MS: u64 = 10;

/// A lap snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRecord {
    /// 1-based position in the lap list.
    pub index: usize,
    /// Total elapsed time when the lap was taken.
    pub cumulative_ms: u64,
    /// Time since the previous lap (or since zero for the first).
    pub split_ms: u64,
}

/// Stopwatch state.
///
/// Time only advances through [`ElapsedTimer::on_tick`]; the caller owns the
/// tick subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElapsedTimer {
    accumulated_ms: u64,
    running: bool,
    laps: Vec<LapRecord>,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the timer transitioned to running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        tracing::debug!(accumulated_ms = self.accumulated_ms, "stopwatch started");
        true
    }

    /// Returns `true` if the timer transitioned to paused.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        tracing::debug!(accumulated_ms = self.accumulated_ms, "stopwatch paused");
        true
    }

    /// Adds `delta_ms` while running. Ignored while paused.
    pub fn on_tick(&mut self, delta_ms: u64) {
        if self.running {
            self.accumulated_ms = self.accumulated_ms.saturating_add(delta_ms);
        }
    }

    /// Records a lap at the current elapsed time.
    ///
    /// Returns `None` without recording anything when no time has elapsed.
    pub fn lap(&mut self) -> Option<LapRecord> {
        if self.accumulated_ms == 0 {
            return None;
        }
        let previous = self.laps.last().map_or(0, |lap| lap.cumulative_ms);
        let record = LapRecord {
            index: self.laps.len() + 1,
            cumulative_ms: self.accumulated_ms,
            split_ms: self.accumulated_ms.saturating_sub(previous),
        };
        self.laps.push(record);
        tracing::debug!(index = record.index, split_ms = record.split_ms, "lap recorded");
        Some(record)
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.accumulated_ms = 0;
        self.laps.clear();
        tracing::debug!("stopwatch reset");
    }

    pub const fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Laps in the order they were recorded.
    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    /// `MM:SS.CC`.
    pub fn format_display(&self) -> String {
        format::stopwatch(self.accumulated_ms)
    }
}
