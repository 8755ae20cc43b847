//! Alarm commands: manage the rule list and watch for alarms coming due.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tock_core::{
    AlarmDriver, AlarmRule, Alerter, CoreError, FireReason, FiredAlarm, RuleDraft, RuleId,
    RuleStore, ScheduleMatcher, Sound, SystemClock, TickScheduler, TitleReset, WallClock,
    Weekdays,
};
use tock_db::Database;

use super::util;
use crate::cli::{AlarmAddArgs, AlarmEditArgs};
use crate::runtime::RealTime;
use crate::terminal::{TerminalBell, TerminalNotifier};
use crate::Config;

const EMPTY_LIST: &str = "No alarms set. Add one with: tock alarm add --time HH:MM";

fn parse_days(days: Option<&str>) -> Result<Option<Weekdays>> {
    Ok(days.map(Weekdays::parse_list).transpose()?)
}

fn parse_sound(sound: Option<&str>) -> Result<Option<Sound>> {
    Ok(sound.map(str::parse::<Sound>).transpose()?)
}

pub fn add<W: Write, S: RuleStore>(
    writer: &mut W,
    alarms: &mut ScheduleMatcher<S>,
    args: &AlarmAddArgs,
    created_at: DateTime<Utc>,
) -> Result<RuleId> {
    let draft = RuleDraft {
        time: args.time.clone(),
        label: args.label.clone(),
        weekdays: parse_days(args.days.as_deref())?,
        snooze_minutes: args.snooze,
        enabled: Some(!args.disabled),
        sound: parse_sound(args.sound.as_deref())?,
    };
    let id = alarms.add_rule(draft, created_at)?;
    let rule = alarms.get(id).context("added alarm is missing")?;
    writeln!(
        writer,
        "Added alarm {id} at {} ({})",
        rule.time_of_day, rule.weekdays
    )?;
    Ok(id)
}

fn table_row(rule: &AlarmRule) -> String {
    let id = rule.id.to_string();
    let time = rule.time_of_day.to_string();
    let days = rule.weekdays.to_string();
    let snooze = format!("{}m", rule.snooze_minutes);
    let on = if rule.enabled { "yes" } else { "no" };
    format!(
        "{id:<15}{time:<7}{days:<20}{snooze:<8}{:<9}{on:<5}{}",
        rule.sound.as_str(),
        rule.display_label("-")
    )
}

pub fn list<W: Write, S: RuleStore>(
    writer: &mut W,
    alarms: &ScheduleMatcher<S>,
    json: bool,
) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(alarms.rules())?)?;
        return Ok(());
    }
    if alarms.rules().is_empty() {
        writeln!(writer, "{EMPTY_LIST}")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<15}{:<7}{:<20}{:<8}{:<9}{:<5}LABEL",
        "ID", "TIME", "DAYS", "SNOOZE", "SOUND", "ON"
    )?;
    for rule in alarms.rules() {
        writeln!(writer, "{}", table_row(rule))?;
    }
    Ok(())
}

/// Overlays the given flags on the rule's current fields.
pub fn edit<W: Write, S: RuleStore>(
    writer: &mut W,
    alarms: &mut ScheduleMatcher<S>,
    args: &AlarmEditArgs,
) -> Result<()> {
    let mut fields = alarms
        .get(args.id)
        .ok_or(CoreError::UnknownRule(args.id))?
        .fields();

    if let Some(time) = &args.time {
        fields.time_of_day = time.trim().parse()?;
    }
    if let Some(label) = &args.label {
        fields.label.clone_from(label);
    }
    if let Some(days) = parse_days(args.days.as_deref())? {
        fields.weekdays = days;
    }
    if let Some(snooze) = args.snooze {
        fields.snooze_minutes = snooze;
    }
    if let Some(sound) = parse_sound(args.sound.as_deref())? {
        fields.sound = sound;
    }
    if args.enable {
        fields.enabled = true;
    } else if args.disable {
        fields.enabled = false;
    }

    alarms.update_rule(args.id, fields)?;
    writeln!(writer, "Updated alarm {}", args.id)?;
    Ok(())
}

pub fn toggle<W: Write, S: RuleStore>(
    writer: &mut W,
    alarms: &mut ScheduleMatcher<S>,
    id: RuleId,
) -> Result<()> {
    let state = if alarms.toggle_rule(id)? {
        "enabled"
    } else {
        "disabled"
    };
    writeln!(writer, "Alarm {id} is now {state}")?;
    Ok(())
}

pub fn remove<W: Write, S: RuleStore>(
    writer: &mut W,
    alarms: &mut ScheduleMatcher<S>,
    id: RuleId,
) -> Result<()> {
    let rule = alarms.remove_rule(id)?;
    writeln!(writer, "Removed alarm {id} ({})", rule.time_of_day)?;
    Ok(())
}

fn fired_line(alarm: &FiredAlarm) -> String {
    let note = match alarm.reason {
        FireReason::Scheduled => "",
        FireReason::Snoozed => " (snoozed)",
    };
    format!(
        "[{}] {} {}{note}",
        alarm.at.format("%H:%M:%S"),
        alarm.rule.time_of_day,
        alarm.rule.display_label("Alarm")
    )
}

/// Rings alarms as they come due until `q` or Ctrl-C.
///
/// Enter `s` to snooze the alarm that fired last. Rule changes made by other
/// `tock` processes are picked up on the next `watch`.
pub async fn watch<W: Write>(writer: &mut W, db: Database, config: &Config) -> Result<()> {
    let real = RealTime::new(TickScheduler::new());
    let _title = TitleReset::new(TerminalNotifier);
    let mut alerter = Alerter::new(TerminalBell::new(config.bell), TerminalNotifier);
    alerter.prime();
    let mut driver = AlarmDriver::new(
        real.scheduler().clone(),
        ScheduleMatcher::load(db),
        SystemClock,
        alerter,
    );

    let enabled = driver
        .matcher()
        .rules()
        .iter()
        .filter(|rule| rule.enabled)
        .count();
    writeln!(
        writer,
        "Watching {enabled} enabled alarm(s). Enter s to snooze, q to quit."
    )?;
    driver.arm();

    let mut lines = util::stdin_lines();
    let mut stdin_open = true;
    let mut last_fired: Option<RuleId> = None;
    loop {
        tokio::select! {
            _ = real.tick() => {}
            line = lines.next_line(), if stdin_open => {
                real.catch_up();
                match line {
                    Ok(Some(line)) => match line.trim() {
                        "s" => match last_fired {
                            Some(id) => {
                                let due = driver.with_matcher(|alarms| alarms.snooze(id, SystemClock.now()))?;
                                writeln!(writer, "Snoozed alarm {id} until {}", due.format("%H:%M"))?;
                            }
                            None => writeln!(writer, "Nothing to snooze yet.")?,
                        },
                        "q" => break,
                        _ => {}
                    },
                    // Keep watching without input, e.g. when run in the background.
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        for alarm in driver.drain_fired() {
            writeln!(writer, "{}", fired_line(&alarm))?;
            last_fired = Some(alarm.rule.id);
        }
    }

    driver.disarm();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn created_at() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_767_592_800_000).unwrap()
    }

    fn open(path: &std::path::Path) -> ScheduleMatcher<Database> {
        ScheduleMatcher::load(Database::open(path).unwrap())
    }

    fn add_args(time: &str) -> AlarmAddArgs {
        AlarmAddArgs {
            time: time.to_string(),
            label: None,
            days: None,
            snooze: None,
            sound: None,
            disabled: false,
        }
    }

    fn edit_args(id: RuleId) -> AlarmEditArgs {
        AlarmEditArgs {
            id,
            time: None,
            label: None,
            days: None,
            snooze: None,
            sound: None,
            enable: false,
            disable: false,
        }
    }

    fn seed(alarms: &mut ScheduleMatcher<Database>) -> (RuleId, RuleId) {
        let mut sink = Vec::new();
        let wake = AlarmAddArgs {
            label: Some("Wake up".to_string()),
            days: Some("fri,mon".to_string()),
            snooze: Some(10),
            sound: Some("gentle".to_string()),
            ..add_args("07:00")
        };
        let first = add(&mut sink, alarms, &wake, created_at()).unwrap();
        let late = AlarmAddArgs {
            disabled: true,
            ..add_args("22:30")
        };
        let second = add(&mut sink, alarms, &late, created_at()).unwrap();
        (first, second)
    }

    #[test]
    fn list_shows_table_in_insertion_order() {
        let temp = tempfile::tempdir().unwrap();
        let mut alarms = open(&temp.path().join("tock.db"));
        seed(&mut alarms);

        let mut output = Vec::new();
        list(&mut output, &alarms, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ID             TIME   DAYS                SNOOZE  SOUND    ON   LABEL
        1767592800000  07:00  mon, fri            10m     gentle   yes  Wake up
        1767592800001  22:30  Once                5m      default  no   -
        ");
    }

    #[test]
    fn list_empty_points_at_add() {
        let temp = tempfile::tempdir().unwrap();
        let alarms = open(&temp.path().join("tock.db"));

        let mut output = Vec::new();
        list(&mut output, &alarms, false).unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"No alarms set. Add one with: tock alarm add --time HH:MM"
        );
    }

    #[test]
    fn list_json_uses_stored_field_names() {
        let temp = tempfile::tempdir().unwrap();
        let mut alarms = open(&temp.path().join("tock.db"));
        seed(&mut alarms);

        let mut output = Vec::new();
        list(&mut output, &alarms, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let first = &value[0];
        assert_eq!(first["time"], "07:00");
        assert_eq!(first["days"], serde_json::json!(["mon", "fri"]));
        assert_eq!(first["snooze"], 10);
        assert_eq!(first["sound"], "gentle");
        assert!(first["createdAt"].is_string());
        assert_eq!(value[1]["enabled"], false);
    }

    #[test]
    fn add_reports_and_persists() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tock.db");
        let mut alarms = open(&path);

        let mut output = Vec::new();
        let id = add(&mut output, &mut alarms, &add_args("06:45"), created_at()).unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"Added alarm 1767592800000 at 06:45 (Once)"
        );

        let reopened = open(&path);
        assert_eq!(reopened.get(id).unwrap().time_of_day.to_string(), "06:45");
    }

    #[test]
    fn add_rejects_bad_input_without_storing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tock.db");
        let mut alarms = open(&path);
        let mut output = Vec::new();

        for args in [
            add_args("25:00"),
            AlarmAddArgs {
                days: Some("mon,funday".to_string()),
                ..add_args("07:00")
            },
            AlarmAddArgs {
                sound: Some("siren".to_string()),
                ..add_args("07:00")
            },
            AlarmAddArgs {
                snooze: Some(0),
                ..add_args("07:00")
            },
        ] {
            assert!(add(&mut output, &mut alarms, &args, created_at()).is_err());
        }
        assert!(output.is_empty());
        assert!(open(&path).rules().is_empty());
    }

    #[test]
    fn edit_overlays_only_given_fields() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tock.db");
        let mut alarms = open(&path);
        let (wake, _) = seed(&mut alarms);

        let mut output = Vec::new();
        let args = AlarmEditArgs {
            time: Some("07:15".to_string()),
            days: Some(String::new()),
            disable: true,
            ..edit_args(wake)
        };
        edit(&mut output, &mut alarms, &args).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("Updated alarm {wake}\n")
        );

        let rule = open(&path).get(wake).cloned().unwrap();
        assert_eq!(rule.time_of_day.to_string(), "07:15");
        assert!(rule.weekdays.is_empty());
        assert!(!rule.enabled);
        assert_eq!(rule.label, "Wake up");
        assert_eq!(rule.snooze_minutes, 10);
        assert_eq!(rule.sound, Sound::Gentle);
    }

    #[test]
    fn edit_unknown_alarm_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut alarms = open(&temp.path().join("tock.db"));

        let mut output = Vec::new();
        let err = edit(&mut output, &mut alarms, &edit_args(RuleId::new(42))).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn toggle_and_remove() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tock.db");
        let mut alarms = open(&path);
        let (wake, late) = seed(&mut alarms);

        let mut output = Vec::new();
        toggle(&mut output, &mut alarms, wake).unwrap();
        toggle(&mut output, &mut alarms, late).unwrap();
        remove(&mut output, &mut alarms, wake).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Alarm 1767592800000 is now disabled
        Alarm 1767592800001 is now enabled
        Removed alarm 1767592800000 (07:00)
        ");

        let reopened = open(&path);
        assert_eq!(reopened.rules().len(), 1);
        assert!(reopened.get(late).unwrap().enabled);
        assert!(remove(&mut Vec::new(), &mut alarms, wake).is_err());
    }
}
