//! Terminal clock CLI library.
//!
//! This crate provides the CLI interface over `tock-core`: argument parsing,
//! configuration, the real-time tick loop, and the terminal alert sinks.

mod cli;
pub mod commands;
mod config;
pub mod runtime;
pub mod terminal;

pub use cli::{AlarmAction, AlarmAddArgs, AlarmEditArgs, Cli, Commands, TimerArgs};
pub use config::Config;
