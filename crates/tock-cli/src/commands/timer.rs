//! Timer command: a countdown with a progress bar.

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use anyhow::{Result, bail};
use tock_core::{Alerter, CountdownDriver, CountdownTimer, TickScheduler, TitleReset};

use super::util::{self, HoursMinutesSeconds};
use crate::cli::TimerArgs;
use crate::runtime::RealTime;
use crate::terminal::{TerminalBell, TerminalNotifier};
use crate::Config;

const BAR_WIDTH: usize = 20;

/// Resolves the requested duration from either form of arguments.
pub fn requested_duration(args: &TimerArgs) -> Result<HoursMinutesSeconds> {
    if let Some(duration) = &args.duration {
        return util::parse_duration(duration);
    }
    if args.hours.is_none() && args.minutes.is_none() && args.seconds.is_none() {
        bail!("give a duration (e.g. 25m) or --hours/--minutes/--seconds");
    }
    Ok(HoursMinutesSeconds {
        hours: args.hours.unwrap_or(0),
        minutes: args.minutes.unwrap_or(0),
        seconds: args.seconds.unwrap_or(0),
    })
}

/// `HH:MM:SS [#####...............]  25%`, plus a pause marker.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "progress is clamped to [0, 100] before scaling"
)]
pub fn status_line(timer: &CountdownTimer) -> String {
    let percent = timer.progress_percent().clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let paused = if timer.is_running() || timer.is_finished() {
        ""
    } else {
        "  (paused)"
    };
    format!(
        "{} [{bar}] {:>3.0}%{paused}",
        timer.format_display(),
        percent
    )
}

fn redraw<W: Write>(writer: &mut W, timer: &CountdownTimer) -> Result<()> {
    // Trailing spaces wipe a longer previous line.
    write!(writer, "\r{}          ", status_line(timer))?;
    writer.flush()?;
    Ok(())
}

/// Runs the countdown until it finishes, the user quits, or Ctrl-C.
///
/// Enter `p` to pause or resume, `q` to quit.
pub async fn run<W: Write>(writer: &mut W, args: &TimerArgs, config: &Config) -> Result<()> {
    let duration = requested_duration(args)?;
    let real = RealTime::new(TickScheduler::new());
    let _title = TitleReset::new(TerminalNotifier);

    let finished = Rc::new(Cell::new(false));
    let done = Rc::clone(&finished);
    let mut alerter = Alerter::new(TerminalBell::new(config.bell), TerminalNotifier);
    let mut countdown = CountdownDriver::new(real.scheduler().clone(), move || {
        done.set(true);
        alerter.countdown_finished();
    });
    countdown.configure(duration.hours, duration.minutes, duration.seconds)?;
    countdown.start()?;
    tracing::debug!(total_ms = countdown.timer().total_ms(), "timer running");

    let mut lines = util::stdin_lines();
    let mut stdin_open = true;
    redraw(writer, &countdown.timer())?;
    while !finished.get() {
        tokio::select! {
            _ = real.tick() => {}
            line = lines.next_line(), if stdin_open => {
                real.catch_up();
                match line {
                    Ok(Some(line)) => match line.trim() {
                        "p" if countdown.timer().is_running() => countdown.pause(),
                        "p" => countdown.start()?,
                        "q" => break,
                        _ => {}
                    },
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        redraw(writer, &countdown.timer())?;
    }

    writeln!(writer)?;
    if finished.get() {
        writeln!(writer, "Timer finished.")?;
    } else {
        countdown.reset();
        writeln!(writer, "Timer cancelled.")?;
    }
    Ok(())
}
