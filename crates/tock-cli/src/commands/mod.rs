//! CLI subcommand implementations.

pub mod alarm;
pub mod clock;
pub mod stopwatch;
pub mod timer;
pub mod util;
