//! Wall-clock access and analog clock-face arithmetic.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{Duration, Local, NaiveDateTime, Timelike};

/// Source of local wall-clock time.
pub trait WallClock {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

/// Hand angles and readouts for one instant, in degrees clockwise from 12.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockFace {
    pub hour_degrees: f64,
    pub minute_degrees: f64,
    pub second_degrees: f64,
    instant: NaiveDateTime,
}

impl ClockFace {
    pub fn at(instant: NaiveDateTime) -> Self {
        let hours = f64::from(instant.hour() % 12);
        let minutes = f64::from(instant.minute());
        let seconds = f64::from(instant.second());
        Self {
            hour_degrees: rotation(hours + minutes / 60.0, 12.0),
            minute_degrees: rotation(minutes + seconds / 60.0, 60.0),
            second_degrees: rotation(seconds, 60.0),
            instant,
        }
    }

    /// 24h `HH:MM:SS`.
    pub fn time_text(&self) -> String {
        self.instant.format("%H:%M:%S").to_string()
    }

    /// e.g. `Saturday, October 17, 2026`.
    pub fn date_text(&self) -> String {
        self.instant.format("%A, %B %-d, %Y").to_string()
    }
}

fn rotation(unit: f64, max: f64) -> f64 {
    unit / max * 360.0
}
