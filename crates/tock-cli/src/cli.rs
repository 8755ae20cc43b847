//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tock_core::RuleId;

/// Terminal clock.
///
/// A live clock, a countdown timer, a stopwatch with laps, and alarms that
/// ring while `tock alarm watch` is running.
#[derive(Debug, Parser)]
#[command(name = "tock", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the current time, date, and clock-hand angles.
    Clock {
        /// Print once and exit instead of updating every second.
        #[arg(long)]
        once: bool,
    },

    /// Count down a duration.
    Timer(TimerArgs),

    /// Run a stopwatch. Enter records a lap; p pauses, r resets, q quits.
    Stopwatch,

    /// Manage alarms.
    #[command(subcommand)]
    Alarm(AlarmAction),
}

#[derive(Debug, Args)]
pub struct TimerArgs {
    /// Duration such as 90s, 25m, or 1h30m.
    pub duration: Option<String>,

    /// Hours (0-23).
    #[arg(long, conflicts_with = "duration", allow_hyphen_values = true)]
    pub hours: Option<i64>,

    /// Minutes (0-59).
    #[arg(long, conflicts_with = "duration", allow_hyphen_values = true)]
    pub minutes: Option<i64>,

    /// Seconds (0-59).
    #[arg(long, conflicts_with = "duration", allow_hyphen_values = true)]
    pub seconds: Option<i64>,
}

/// Alarm subcommands.
#[derive(Debug, Subcommand)]
pub enum AlarmAction {
    /// Add an alarm.
    Add(AlarmAddArgs),

    /// List alarms.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an existing alarm.
    Edit(AlarmEditArgs),

    /// Enable a disabled alarm or disable an enabled one.
    Toggle {
        /// Alarm ID.
        id: RuleId,
    },

    /// Delete an alarm.
    Remove {
        /// Alarm ID.
        id: RuleId,
    },

    /// Ring alarms as they come due. Enter s to snooze the last one.
    Watch,
}

#[derive(Debug, Args)]
pub struct AlarmAddArgs {
    /// Time of day, 24h HH:MM.
    #[arg(long)]
    pub time: String,

    /// Label shown when the alarm rings.
    #[arg(long)]
    pub label: Option<String>,

    /// Repeat days, e.g. mon,wed,fri. Omit to ring on any day.
    #[arg(long)]
    pub days: Option<String>,

    /// Snooze length in minutes.
    #[arg(long)]
    pub snooze: Option<u32>,

    /// Sound: default, gentle, loud, or nature.
    #[arg(long)]
    pub sound: Option<String>,

    /// Create the alarm disabled.
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Debug, Args)]
pub struct AlarmEditArgs {
    /// Alarm ID.
    pub id: RuleId,

    /// New time of day, 24h HH:MM.
    #[arg(long)]
    pub time: Option<String>,

    /// New label.
    #[arg(long)]
    pub label: Option<String>,

    /// New repeat days; pass an empty string to ring on any day.
    #[arg(long)]
    pub days: Option<String>,

    /// New snooze length in minutes.
    #[arg(long)]
    pub snooze: Option<u32>,

    /// New sound.
    #[arg(long)]
    pub sound: Option<String>,

    /// Enable the alarm.
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Disable the alarm.
    #[arg(long)]
    pub disable: bool,
}
