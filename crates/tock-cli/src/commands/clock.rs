//! Clock command: the live wall clock.

use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use tock_core::{ClockFace, SystemClock, TickScheduler, TickSource, WallClock};

use crate::runtime::RealTime;

/// One readout line: time, date, and hand angles.
pub fn readout(now: NaiveDateTime) -> String {
    let face = ClockFace::at(now);
    format!(
        "{}  {}  [h {:.1}° m {:.1}° s {:.1}°]",
        face.time_text(),
        face.date_text(),
        face.hour_degrees,
        face.minute_degrees,
        face.second_degrees
    )
}

pub fn run_once<W: Write>(writer: &mut W, clock: &impl WallClock) -> Result<()> {
    writeln!(writer, "{}", readout(clock.now()))?;
    Ok(())
}

/// Redraws the readout every second until Ctrl-C.
pub async fn run<W: Write>(writer: &mut W) -> Result<()> {
    let real = RealTime::new(TickScheduler::new());
    let _refresh = real
        .scheduler()
        .subscribe(Duration::from_secs(1), Box::new(|| ControlFlow::Continue(())));

    write!(writer, "\r{}", readout(SystemClock.now()))?;
    writer.flush()?;
    loop {
        tokio::select! {
            _ = real.tick() => {
                write!(writer, "\r{}", readout(SystemClock.now()))?;
                writer.flush()?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    writeln!(writer)?;
    Ok(())
}
