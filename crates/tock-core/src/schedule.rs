//! Alarm rule set and wall-clock matching.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};

use crate::error::CoreError;
use crate::rule::{AlarmRule, RuleDraft, RuleFields, decode_rules, encode_rules};
use crate::store::RuleStore;
use crate::types::{RuleId, TimeOfDay, Weekday};

/// Why a rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireReason {
    /// The rule's time and weekday matched the wall clock.
    Scheduled,
    /// A snooze requested earlier came due.
    Snoozed,
}

/// A rule reported by [`ScheduleMatcher::check_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredAlarm {
    pub rule: AlarmRule,
    pub reason: FireReason,
    pub at: NaiveDateTime,
}

/// The alarm rule set.
///
/// Rules keep insertion order, which is also the order in which simultaneous
/// firings are reported. A rule fires at most once per calendar minute; the
/// matcher remembers the last minute each rule fired in.
pub struct ScheduleMatcher<S> {
    store: S,
    rules: Vec<AlarmRule>,
    last_fired: HashMap<RuleId, NaiveDateTime>,
    snoozed: HashMap<RuleId, NaiveDateTime>,
    last_id: i64,
}

impl<S: RuleStore> ScheduleMatcher<S> {
    /// Loads the stored rule list.
    ///
    /// Unreadable or corrupt storage is logged and treated as empty. Duplicate
    /// ids keep their first occurrence.
    pub fn load(store: S) -> Self {
        let rules = match store.load_blob() {
            Ok(Some(blob)) => decode_rules(&blob).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "stored alarms are unreadable; starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load alarms; starting empty");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let rules: Vec<AlarmRule> = rules
            .into_iter()
            .filter(|rule| {
                let fresh = seen.insert(rule.id);
                if !fresh {
                    tracing::warn!(id = %rule.id, "dropping alarm with duplicate id");
                }
                fresh
            })
            .collect();
        let last_id = rules.iter().map(|rule| rule.id.value()).max().unwrap_or(0);
        tracing::debug!(count = rules.len(), "alarms loaded");

        Self {
            store,
            rules,
            last_fired: HashMap::new(),
            snoozed: HashMap::new(),
            last_id,
        }
    }

    pub fn rules(&self) -> &[AlarmRule] {
        &self.rules
    }

    pub fn get(&self, id: RuleId) -> Option<&AlarmRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Adds a rule created at `created_at` and returns its fresh id.
    pub fn add_rule(&mut self, draft: RuleDraft, created_at: DateTime<Utc>) -> Result<RuleId, CoreError> {
        let RuleFields {
            time_of_day,
            label,
            weekdays,
            snooze_minutes,
            enabled,
            sound,
        } = draft.into_fields()?;
        let id = RuleId::new(
            created_at
                .timestamp_millis()
                .max(self.last_id.saturating_add(1)),
        );
        self.last_id = id.value();

        let rule = AlarmRule {
            id,
            time_of_day,
            label,
            weekdays,
            snooze_minutes,
            enabled,
            sound,
            created_at,
        };
        tracing::debug!(%id, time = %rule.time_of_day, "alarm added");
        self.rules.push(rule);
        self.persist();
        Ok(id)
    }

    /// Replaces every mutable field of rule `id`.
    pub fn update_rule(&mut self, id: RuleId, fields: RuleFields) -> Result<(), CoreError> {
        fields.validate()?;
        let rule = self.rule_mut(id)?;
        rule.apply(fields);
        let enabled = rule.enabled;
        self.last_fired.remove(&id);
        if !enabled {
            self.snoozed.remove(&id);
        }
        tracing::debug!(%id, "alarm updated");
        self.persist();
        Ok(())
    }

    /// Flips `enabled` and returns the new value.
    pub fn toggle_rule(&mut self, id: RuleId) -> Result<bool, CoreError> {
        let rule = self.rule_mut(id)?;
        rule.enabled = !rule.enabled;
        let enabled = rule.enabled;
        if !enabled {
            self.snoozed.remove(&id);
        }
        tracing::debug!(%id, enabled, "alarm toggled");
        self.persist();
        Ok(enabled)
    }

    pub fn remove_rule(&mut self, id: RuleId) -> Result<AlarmRule, CoreError> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or(CoreError::UnknownRule(id))?;
        let rule = self.rules.remove(index);
        self.last_fired.remove(&id);
        self.snoozed.remove(&id);
        tracing::debug!(%id, "alarm removed");
        self.persist();
        Ok(rule)
    }

    /// Schedules a one-off re-fire of rule `id` its snooze length after `now`.
    /// Returns when it will fire. Snoozing again replaces the pending snooze.
    pub fn snooze(&mut self, id: RuleId, now: NaiveDateTime) -> Result<NaiveDateTime, CoreError> {
        let rule = self.get(id).ok_or(CoreError::UnknownRule(id))?;
        let due = now + Duration::minutes(i64::from(rule.snooze_minutes));
        self.snoozed.insert(id, due);
        tracing::debug!(%id, %due, "alarm snoozed");
        Ok(due)
    }

    /// Pending snooze deadline for rule `id`.
    pub fn snoozed_until(&self, id: RuleId) -> Option<NaiveDateTime> {
        self.snoozed.get(&id).copied()
    }

    /// Reports every enabled rule that fires at wall-clock `now`.
    ///
    /// A rule matches when its time equals the `HH:MM` of `now` and its
    /// weekdays are empty or include the weekday of `now`. Each rule fires at
    /// most once per minute however often this is called.
    pub fn check_tick(&mut self, now: NaiveDateTime) -> Vec<FiredAlarm> {
        let minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let time = TimeOfDay::of(now);
        let day = Weekday::from(now.weekday());

        let mut fired = Vec::new();
        for rule in &self.rules {
            if !rule.enabled {
                continue;
            }
            let scheduled = rule.time_of_day == time
                && rule.weekdays.admits(day)
                && self.last_fired.get(&rule.id) != Some(&minute);
            if scheduled {
                self.last_fired.insert(rule.id, minute);
                self.snoozed.remove(&rule.id);
                fired.push(FiredAlarm {
                    rule: rule.clone(),
                    reason: FireReason::Scheduled,
                    at: now,
                });
            } else if self.snoozed.get(&rule.id).is_some_and(|due| *due <= now) {
                self.snoozed.remove(&rule.id);
                fired.push(FiredAlarm {
                    rule: rule.clone(),
                    reason: FireReason::Snoozed,
                    at: now,
                });
            }
        }

        for alarm in &fired {
            tracing::debug!(id = %alarm.rule.id, reason = ?alarm.reason, "alarm fired");
        }
        fired
    }

    fn rule_mut(&mut self, id: RuleId) -> Result<&mut AlarmRule, CoreError> {
        self.rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or(CoreError::UnknownRule(id))
    }

    fn persist(&self) {
        let blob = match encode_rules(&self.rules) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize alarms");
                return;
            }
        };
        if let Err(err) = self.store.save_blob(&blob) {
            tracing::warn!(error = %err, "failed to save alarms");
        }
    }
}
