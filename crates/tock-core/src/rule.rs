//! Alarm rules and their stored JSON shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RuleId, Sound, TimeOfDay, ValidationError, Weekdays};

/// Snooze length applied when a new rule does not name one.
pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;

/// A time-of-day alarm with optional repeat days.
///
/// Field names on the wire match the stored rule list:
/// `{id, time, label, days, snooze, enabled, sound, createdAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRule {
    pub id: RuleId,
    #[serde(rename = "time")]
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "days", default)]
    pub weekdays: Weekdays,
    #[serde(rename = "snooze", default = "default_snooze")]
    pub snooze_minutes: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub sound: Sound,
    pub created_at: DateTime<Utc>,
}

const fn default_snooze() -> u32 {
    DEFAULT_SNOOZE_MINUTES
}

const fn default_enabled() -> bool {
    true
}

impl AlarmRule {
    /// The mutable part of the rule.
    pub fn fields(&self) -> RuleFields {
        RuleFields {
            time_of_day: self.time_of_day,
            label: self.label.clone(),
            weekdays: self.weekdays.clone(),
            snooze_minutes: self.snooze_minutes,
            enabled: self.enabled,
            sound: self.sound,
        }
    }

    pub(crate) fn apply(&mut self, fields: RuleFields) {
        self.time_of_day = fields.time_of_day;
        self.label = fields.label;
        self.weekdays = fields.weekdays;
        self.snooze_minutes = fields.snooze_minutes;
        self.enabled = fields.enabled;
        self.sound = fields.sound;
    }

    /// Label shown in notifications, falling back to `fallback` when blank.
    pub fn display_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.label.trim().is_empty() {
            fallback
        } else {
            &self.label
        }
    }
}

/// Every field of a rule except its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFields {
    pub time_of_day: TimeOfDay,
    pub label: String,
    pub weekdays: Weekdays,
    pub snooze_minutes: u32,
    pub enabled: bool,
    pub sound: Sound,
}

impl RuleFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.snooze_minutes == 0 {
            return Err(ValidationError::ZeroSnooze);
        }
        Ok(())
    }
}

/// A partially specified rule, as submitted by an "add alarm" form.
///
/// Only `time` is required; everything else falls back to the rule defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDraft {
    pub time: String,
    pub label: Option<String>,
    pub weekdays: Option<Weekdays>,
    pub snooze_minutes: Option<u32>,
    pub enabled: Option<bool>,
    pub sound: Option<Sound>,
}

impl RuleDraft {
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            ..Self::default()
        }
    }

    /// Validates the draft and fills in defaults.
    pub fn into_fields(self) -> Result<RuleFields, ValidationError> {
        let time = self.time.trim();
        if time.is_empty() {
            return Err(ValidationError::Empty { field: "time" });
        }
        let fields = RuleFields {
            time_of_day: time.parse()?,
            label: self.label.unwrap_or_default(),
            weekdays: self.weekdays.unwrap_or_default(),
            snooze_minutes: self.snooze_minutes.unwrap_or(DEFAULT_SNOOZE_MINUTES),
            enabled: self.enabled.unwrap_or(true),
            sound: self.sound.unwrap_or_default(),
        };
        fields.validate()?;
        Ok(fields)
    }
}

/// Serializes a rule list to the stored JSON array.
pub fn encode_rules(rules: &[AlarmRule]) -> serde_json::Result<String> {
    serde_json::to_string(rules)
}

/// Parses a stored JSON array of rules.
pub fn decode_rules(blob: &str) -> serde_json::Result<Vec<AlarmRule>> {
    serde_json::from_str(blob)
}
