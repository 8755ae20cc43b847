//! Core type definitions with validation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
///
/// Every variant is a rejected configuration: the operation that produced it
/// left all state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A time of day was not in 24h `HH:MM` form.
    #[error("invalid time of day: {value:?} (expected HH:MM)")]
    InvalidTimeOfDay { value: String },

    /// A weekday tag outside `sun`..`sat`.
    #[error("unknown weekday: {value}")]
    UnknownWeekday { value: String },

    /// A sound name outside the known set.
    #[error("unknown sound: {value}")]
    UnknownSound { value: String },

    /// Snooze length must be at least one minute.
    #[error("snooze must be at least one minute")]
    ZeroSnooze,

    /// A countdown was configured with an all-zero duration.
    #[error("countdown duration must be greater than zero")]
    ZeroDuration,

    /// A countdown can only be configured while idle.
    #[error("countdown is already configured or running; reset it first")]
    CountdownActive,
}

/// Identifier of an alarm rule.
///
/// Assigned from the creation timestamp in milliseconds, bumped when two rules
/// are created within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

impl RuleId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RuleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A wall-clock minute in 24h form, always rendered as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Creates a time of day, rejecting out-of-range fields.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTimeOfDay {
                value: format!("{hour}:{minute}"),
            });
        }
        Ok(Self { hour, minute })
    }

    /// The minute containing `instant`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "chrono guarantees hour < 24 and minute < 60"
    )]
    pub fn of(instant: NaiveDateTime) -> Self {
        Self {
            hour: instant.hour() as u8,
            minute: instant.minute() as u8,
        }
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Empty {
                field: "time of day",
            });
        }
        let invalid = || ValidationError::InvalidTimeOfDay {
            value: s.to_string(),
        };
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Day-of-week tag, ordered Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Sun,
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Self::Sun,
            chrono::Weekday::Mon => Self::Mon,
            chrono::Weekday::Tue => Self::Tue,
            chrono::Weekday::Wed => Self::Wed,
            chrono::Weekday::Thu => Self::Thu,
            chrono::Weekday::Fri => Self::Fri,
            chrono::Weekday::Sat => Self::Sat,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == tag)
            .ok_or_else(|| ValidationError::UnknownWeekday {
                value: s.to_string(),
            })
    }
}

/// The repeat days of a rule. Empty means "any day".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekdays(BTreeSet<Weekday>);

impl Weekdays {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self(days.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a rule with these days may fire on `day`.
    pub fn admits(&self, day: Weekday) -> bool {
        self.0.is_empty() || self.0.contains(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    /// Parses a comma-separated list such as `mon,wed,fri`.
    pub fn parse_list(s: &str) -> Result<Self, ValidationError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("Once"),
            7 => f.write_str("Every day"),
            _ => {
                let tags: Vec<&str> = self.iter().map(Weekday::as_str).collect();
                f.write_str(&tags.join(", "))
            }
        }
    }
}

/// Audible cue played when an alarm fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    #[default]
    Default,
    Gentle,
    Loud,
    Nature,
}

impl Sound {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Gentle => "gentle",
            Self::Loud => "loud",
            Self::Nature => "nature",
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sound {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "gentle" => Ok(Self::Gentle),
            "loud" => Ok(Self::Loud),
            "nature" => Ok(Self::Nature),
            _ => Err(ValidationError::UnknownSound {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn time_of_day_parses_zero_padded() {
        let time: TimeOfDay = "07:05".parse().unwrap();
        assert_eq!(time.hour(), 7);
        assert_eq!(time.minute(), 5);
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn time_of_day_rejects_malformed() {
        for bad in ["7:05", "07:5", "24:00", "12:60", "0705", "ab:cd", "07:05:00"] {
            assert!(
                matches!(
                    bad.parse::<TimeOfDay>(),
                    Err(ValidationError::InvalidTimeOfDay { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn time_of_day_rejects_empty() {
        assert_eq!(
            "".parse::<TimeOfDay>(),
            Err(ValidationError::Empty {
                field: "time of day"
            })
        );
    }

    #[test]
    fn time_of_day_of_instant_truncates_seconds() {
        let instant = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();
        assert_eq!(TimeOfDay::of(instant).to_string(), "23:59");
    }

    #[test]
    fn time_of_day_serde_rejects_malformed() {
        let result: Result<TimeOfDay, _> = serde_json::from_str("\"25:00\"");
        assert!(result.is_err());
    }

    #[test]
    fn weekday_from_chrono_and_str() {
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sun);
        assert_eq!("MON".parse::<Weekday>().unwrap(), Weekday::Mon);
        assert!("monday".parse::<Weekday>().is_err());
    }

    #[test]
    fn weekdays_empty_admits_every_day() {
        let days = Weekdays::default();
        assert!(Weekday::ALL.into_iter().all(|day| days.admits(day)));
    }

    #[test]
    fn weekdays_parse_list_and_display() {
        let days = Weekdays::parse_list("fri, mon,").unwrap();
        assert!(days.admits(Weekday::Mon));
        assert!(!days.admits(Weekday::Tue));
        assert_eq!(days.to_string(), "mon, fri");
        assert_eq!(Weekdays::default().to_string(), "Once");
        assert_eq!(Weekdays::new(Weekday::ALL).to_string(), "Every day");
    }

    #[test]
    fn sound_from_str() {
        assert_eq!("Gentle".parse::<Sound>().unwrap(), Sound::Gentle);
        assert!("chime".parse::<Sound>().is_err());
        assert_eq!(Sound::default(), Sound::Default);
    }

    #[test]
    fn rule_id_is_a_bare_number_in_json() {
        let json = serde_json::to_string(&RuleId::new(1_700_000_000_000)).unwrap();
        assert_eq!(json, "1700000000000");
    }
}
