//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Pre-compiled regex for compact durations such as `1h30m` or `90s`.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("duration regex is valid")
});

/// A duration split into clock fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursMinutesSeconds {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl HoursMinutesSeconds {
    /// Splits a total number of seconds, carrying overflow into larger fields.
    pub const fn from_total_seconds(total: i64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

/// Parse a countdown duration.
///
/// Supports:
/// - Units: "90s", "25m", "1h30m", "2h5m10s"
/// - Bare seconds: "45"
pub fn parse_duration(s: &str) -> anyhow::Result<HoursMinutesSeconds> {
    let s = s.trim().to_ascii_lowercase();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let total: i64 = s.parse().context("duration is too large")?;
        return Ok(HoursMinutesSeconds::from_total_seconds(total));
    }

    let caps = DURATION_RE
        .captures(&s)
        .filter(|caps| caps.iter().skip(1).any(|group| group.is_some()))
        .with_context(|| format!("invalid duration: {s:?}. Use e.g. 90s, 25m, or 1h30m"))?;

    let field = |index: usize| -> anyhow::Result<i64> {
        caps.get(index)
            .map_or(Ok(0), |m| m.as_str().parse())
            .context("duration is too large")
    };
    let (hours, minutes, seconds) = (field(1)?, field(2)?, field(3)?);
    let total = hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|hm| hm.checked_add(seconds))
        .context("duration is too large")?;
    Ok(HoursMinutesSeconds::from_total_seconds(total))
}

/// Line reader over stdin for interactive commands.
pub fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(hours: i64, minutes: i64, seconds: i64) -> HoursMinutesSeconds {
        HoursMinutesSeconds {
            hours,
            minutes,
            seconds,
        }
    }

    #[test]
    fn parses_unit_durations() {
        assert_eq!(parse_duration("25m").unwrap(), hms(0, 25, 0));
        assert_eq!(parse_duration("1h30m").unwrap(), hms(1, 30, 0));
        assert_eq!(parse_duration("2H5M10S").unwrap(), hms(2, 5, 10));
    }

    #[test]
    fn carries_overflowing_fields() {
        assert_eq!(parse_duration("90s").unwrap(), hms(0, 1, 30));
        assert_eq!(parse_duration("75m").unwrap(), hms(1, 15, 0));
        assert_eq!(parse_duration("3725").unwrap(), hms(1, 2, 5));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "h", "1x", "m30", "1.5h", "-5s"] {
            assert!(parse_duration(bad).is_err(), "{bad} should be rejected");
        }
    }
}
