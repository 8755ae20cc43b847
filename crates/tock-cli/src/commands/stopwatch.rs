//! Stopwatch command: elapsed time with laps.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tock_core::{ElapsedTimer, LapRecord, StopwatchDriver, TickScheduler, format};

use super::util;
use crate::runtime::RealTime;
use crate::Config;

const HELP: &str = "Enter: lap   p: pause/resume   r: reset   q: quit";

fn lap_row(lap: &LapRecord) -> String {
    format!(
        "{:>3}  {}  {}",
        lap.index,
        format::stopwatch(lap.split_ms),
        format::stopwatch(lap.cumulative_ms)
    )
}

/// Writes the lap table followed by the final total.
pub fn write_laps<W: Write>(writer: &mut W, timer: &ElapsedTimer) -> Result<()> {
    if !timer.laps().is_empty() {
        writeln!(writer, "LAP  SPLIT     TOTAL")?;
        for lap in timer.laps() {
            writeln!(writer, "{}", lap_row(lap))?;
        }
    }
    writeln!(writer, "Total: {}", timer.format_display())?;
    Ok(())
}

fn redraw<W: Write>(writer: &mut W, timer: &ElapsedTimer) -> Result<()> {
    let state = if timer.is_running() { "" } else { "  (paused)" };
    write!(writer, "\r{}{state}          ", timer.format_display())?;
    writer.flush()?;
    Ok(())
}

/// Runs the stopwatch until `q`, end of input, or Ctrl-C.
pub async fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let real = RealTime::new(TickScheduler::new());
    let mut stopwatch = StopwatchDriver::new(
        real.scheduler().clone(),
        Duration::from_millis(config.stopwatch_interval_ms),
    );
    writeln!(writer, "{HELP}")?;
    stopwatch.start();

    let mut lines = util::stdin_lines();
    redraw(writer, &stopwatch.timer())?;
    loop {
        tokio::select! {
            _ = real.tick() => {}
            line = lines.next_line() => {
                real.catch_up();
                match line {
                    Ok(Some(line)) => match line.trim() {
                        "" => {
                            if let Some(lap) = stopwatch.lap() {
                                // The terminal already echoed the newline.
                                writeln!(writer, "lap {}", lap_row(&lap).trim_start())?;
                            }
                        }
                        "p" => stopwatch.toggle(),
                        "r" => {
                            stopwatch.reset();
                            writeln!(writer, "reset")?;
                        }
                        "q" => break,
                        other => tracing::debug!(input = other, "ignored stopwatch input"),
                    },
                    Ok(None) | Err(_) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        redraw(writer, &stopwatch.timer())?;
    }

    real.catch_up();
    stopwatch.pause();
    writeln!(writer)?;
    write_laps(writer, &stopwatch.timer())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn lap_table_lists_splits_and_totals() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        timer.on_tick(1_200);
        timer.lap();
        timer.on_tick(65_350);
        timer.lap();
        timer.on_tick(90);

        let mut output = Vec::new();
        write_laps(&mut output, &timer).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        LAP  SPLIT     TOTAL
          1  00:01.20  00:01.20
          2  01:05.35  01:06.55
        Total: 01:06.64
        ");
    }

    #[test]
    fn no_laps_prints_only_total() {
        let mut output = Vec::new();
        write_laps(&mut output, &ElapsedTimer::new()).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Total: 00:00.00");
    }
}
