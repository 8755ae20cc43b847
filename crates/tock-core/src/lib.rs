//! Core logic for the tock clock.
//!
//! This crate contains the time-tracking components and their contracts:
//! - Stopwatch: elapsed time with lap snapshots
//! - Countdown: fixed duration to zero with a single completion event
//! - Schedule: alarm rules matched against the wall clock
//! - Ticks: cancelable periodic subscriptions and the drivers that use them
//!
//! Components hold plain state and advance only when ticked, so everything
//! here can be exercised with a virtual [`TickScheduler`].

pub mod alert;
pub mod clock;
pub mod countdown;
pub mod driver;
mod error;
pub mod format;
pub mod rule;
pub mod schedule;
pub mod stopwatch;
pub mod store;
pub mod tick;
pub mod types;

pub use alert::{AlertError, Alerter, AudioPlayer, Notifier, TitleReset};
pub use clock::{ClockFace, FixedClock, SystemClock, WallClock};
pub use countdown::{CountdownTimer, Finished};
pub use driver::{AlarmDriver, CountdownDriver, StopwatchDriver};
pub use error::CoreError;
pub use rule::{AlarmRule, RuleDraft, RuleFields};
pub use schedule::{FireReason, FiredAlarm, ScheduleMatcher};
pub use stopwatch::{ElapsedTimer, LapRecord};
pub use store::{ALARMS_KEY, MemoryStore, RuleStore};
pub use tick::{TickHandle, TickScheduler, TickSource};
pub use types::{RuleId, Sound, TimeOfDay, ValidationError, Weekday, Weekdays};
