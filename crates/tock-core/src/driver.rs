//! Binds components to a tick source.
//!
//! Each driver owns one component and at most one live subscription. Every
//! exit path (pause, reset, completion, drop) releases the subscription, so no
//! tick reaches a component after its driver let go of it.

use std::cell::{Ref, RefCell};
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use crate::alert::{Alerter, AudioPlayer, Notifier};
use crate::clock::WallClock;
use crate::countdown::{COUNTDOWN_INTERVAL_MS, CountdownTimer};
use crate::error::CoreError;
use crate::schedule::{FiredAlarm, ScheduleMatcher};
use crate::stopwatch::{ElapsedTimer, LapRecord};
use crate::store::RuleStore;
use crate::tick::{TickHandle, TickSource};
use crate::types::ValidationError;

/// Alarm matching cadence.
pub const ALARM_INTERVAL_MS: u64 = 1000;

fn release(subscription: &mut Option<TickHandle>) {
    if let Some(handle) = subscription.take() {
        handle.cancel();
    }
}

/// A stopwatch fed by a tick source.
pub struct StopwatchDriver<S> {
    source: S,
    interval: Duration,
    timer: Rc<RefCell<ElapsedTimer>>,
    subscription: Option<TickHandle>,
}

impl<S: TickSource> StopwatchDriver<S> {
    /// `interval` is truncated to whole milliseconds, at least one, so the
    /// time added per tick always equals the tick spacing.
    pub fn new(source: S, interval: Duration) -> Self {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Self {
            source,
            interval: Duration::from_millis(interval_ms.max(1)),
            timer: Rc::new(RefCell::new(ElapsedTimer::new())),
            subscription: None,
        }
    }

    pub fn start(&mut self) {
        if !self.timer.borrow_mut().start() {
            return;
        }
        let timer = Rc::clone(&self.timer);
        let delta_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        release(&mut self.subscription);
        self.subscription = Some(self.source.subscribe(
            self.interval,
            Box::new(move || {
                timer.borrow_mut().on_tick(delta_ms);
                ControlFlow::Continue(())
            }),
        ));
    }

    pub fn pause(&mut self) {
        self.timer.borrow_mut().pause();
        release(&mut self.subscription);
    }

    /// Starts when paused, pauses when running.
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn lap(&self) -> Option<LapRecord> {
        self.timer.borrow_mut().lap()
    }

    pub fn reset(&mut self) {
        self.timer.borrow_mut().reset();
        release(&mut self.subscription);
    }

    pub fn is_running(&self) -> bool {
        self.timer.borrow().is_running()
    }

    pub fn is_armed(&self) -> bool {
        self.subscription.as_ref().is_some_and(TickHandle::is_active)
    }

    pub fn timer(&self) -> Ref<'_, ElapsedTimer> {
        self.timer.borrow()
    }
}

impl<S> Drop for StopwatchDriver<S> {
    fn drop(&mut self) {
        release(&mut self.subscription);
    }
}

/// A countdown fed by a one-second tick source.
///
/// `on_finish` runs once per completed countdown, inside the final tick.
pub struct CountdownDriver<S> {
    source: S,
    timer: Rc<RefCell<CountdownTimer>>,
    on_finish: Rc<RefCell<Box<dyn FnMut()>>>,
    subscription: Option<TickHandle>,
}

impl<S: TickSource> CountdownDriver<S> {
    pub fn new(source: S, on_finish: impl FnMut() + 'static) -> Self {
        Self {
            source,
            timer: Rc::new(RefCell::new(CountdownTimer::new())),
            on_finish: Rc::new(RefCell::new(Box::new(on_finish))),
            subscription: None,
        }
    }

    pub fn configure(&self, hours: i64, minutes: i64, seconds: i64) -> Result<u64, CoreError> {
        Ok(self.timer.borrow_mut().configure(hours, minutes, seconds)?)
    }

    /// Starts or resumes. Rejected when nothing is configured.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if !self.timer.borrow_mut().start() {
            return Err(ValidationError::ZeroDuration.into());
        }
        let timer = Rc::clone(&self.timer);
        let on_finish = Rc::clone(&self.on_finish);
        release(&mut self.subscription);
        self.subscription = Some(self.source.subscribe(
            Duration::from_millis(COUNTDOWN_INTERVAL_MS),
            Box::new(move || {
                let finished = timer.borrow_mut().tick();
                if finished.is_none() {
                    return ControlFlow::Continue(());
                }
                (on_finish.borrow_mut())();
                ControlFlow::Break(())
            }),
        ));
        Ok(())
    }

    pub fn pause(&mut self) {
        self.timer.borrow_mut().pause();
        release(&mut self.subscription);
    }

    pub fn reset(&mut self) {
        self.timer.borrow_mut().reset();
        release(&mut self.subscription);
    }

    pub fn is_armed(&self) -> bool {
        self.subscription.as_ref().is_some_and(TickHandle::is_active)
    }

    pub fn timer(&self) -> Ref<'_, CountdownTimer> {
        self.timer.borrow()
    }
}

impl<S> Drop for CountdownDriver<S> {
    fn drop(&mut self) {
        release(&mut self.subscription);
    }
}

/// Checks alarm rules against the wall clock once per second and alerts on
/// every firing.
pub struct AlarmDriver<S, R, C, A, N> {
    source: S,
    matcher: Rc<RefCell<ScheduleMatcher<R>>>,
    clock: Rc<C>,
    alerter: Rc<RefCell<Alerter<A, N>>>,
    fired: Rc<RefCell<Vec<FiredAlarm>>>,
    subscription: Option<TickHandle>,
}

impl<S, R, C, A, N> AlarmDriver<S, R, C, A, N>
where
    S: TickSource,
    R: RuleStore + 'static,
    C: WallClock + 'static,
    A: AudioPlayer + 'static,
    N: Notifier + 'static,
{
    pub fn new(source: S, matcher: ScheduleMatcher<R>, clock: C, alerter: Alerter<A, N>) -> Self {
        Self {
            source,
            matcher: Rc::new(RefCell::new(matcher)),
            clock: Rc::new(clock),
            alerter: Rc::new(RefCell::new(alerter)),
            fired: Rc::new(RefCell::new(Vec::new())),
            subscription: None,
        }
    }

    /// Starts watching. Idempotent.
    pub fn arm(&mut self) {
        if self.is_armed() {
            return;
        }
        let matcher = Rc::clone(&self.matcher);
        let clock = Rc::clone(&self.clock);
        let alerter = Rc::clone(&self.alerter);
        let history = Rc::clone(&self.fired);
        self.subscription = Some(self.source.subscribe(
            Duration::from_millis(ALARM_INTERVAL_MS),
            Box::new(move || {
                let fired = matcher.borrow_mut().check_tick(clock.now());
                let mut alerter = alerter.borrow_mut();
                for alarm in &fired {
                    alerter.alarm_fired(alarm);
                }
                history.borrow_mut().extend(fired);
                ControlFlow::Continue(())
            }),
        ));
        tracing::debug!("alarm watch armed");
    }

    pub fn disarm(&mut self) {
        release(&mut self.subscription);
    }

    pub fn is_armed(&self) -> bool {
        self.subscription.as_ref().is_some_and(TickHandle::is_active)
    }

    /// Alarms fired since the last call.
    pub fn drain_fired(&self) -> Vec<FiredAlarm> {
        std::mem::take(&mut *self.fired.borrow_mut())
    }

    pub fn matcher(&self) -> Ref<'_, ScheduleMatcher<R>> {
        self.matcher.borrow()
    }

    /// Runs `f` against the rule set, e.g. to snooze a rule that just fired.
    pub fn with_matcher<T>(&self, f: impl FnOnce(&mut ScheduleMatcher<R>) -> T) -> T {
        f(&mut self.matcher.borrow_mut())
    }

    pub fn alerter(&self) -> Ref<'_, Alerter<A, N>> {
        self.alerter.borrow()
    }
}

impl<S, R, C, A, N> Drop for AlarmDriver<S, R, C, A, N> {
    fn drop(&mut self) {
        release(&mut self.subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use chrono::{DateTime, NaiveDate};

    use crate::alert::testing::Recorder;
    use crate::clock::FixedClock;
    use crate::rule::RuleDraft;
    use crate::schedule::FireReason;
    use crate::stopwatch::STOPWATCH_INTERVAL_MS;
    use crate::store::MemoryStore;
    use crate::tick::TickScheduler;

    #[test]
    fn stopwatch_runs_only_while_armed() {
        let scheduler = TickScheduler::new();
        let mut stopwatch =
            StopwatchDriver::new(scheduler.clone(), Duration::from_millis(STOPWATCH_INTERVAL_MS));

        stopwatch.start();
        assert!(stopwatch.is_armed());
        scheduler.advance(Duration::from_millis(1230));
        assert_eq!(stopwatch.timer().format_display(), "00:01.23");

        stopwatch.pause();
        assert!(!stopwatch.is_armed());
        assert_eq!(scheduler.subscription_count(), 0);
        scheduler.advance(Duration::from_secs(5));
        assert_eq!(stopwatch.timer().accumulated_ms(), 1230);

        stopwatch.toggle();
        scheduler.advance(Duration::from_millis(770));
        let lap = stopwatch.lap().unwrap();
        assert_eq!(lap.cumulative_ms, 2000);

        stopwatch.reset();
        assert!(!stopwatch.is_armed());
        assert_eq!(scheduler.subscription_count(), 0);
        assert!(stopwatch.timer().laps().is_empty());
    }

    #[test]
    fn stopwatch_start_twice_keeps_one_subscription() {
        let scheduler = TickScheduler::new();
        let mut stopwatch = StopwatchDriver::new(scheduler.clone(), Duration::from_millis(10));
        stopwatch.start();
        stopwatch.start();
        assert_eq!(scheduler.subscription_count(), 1);
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(stopwatch.timer().accumulated_ms(), 100);
    }

    #[test]
    fn stopwatch_interval_below_a_millisecond_still_counts() {
        for interval in [Duration::ZERO, Duration::from_micros(1500)] {
            let scheduler = TickScheduler::new();
            let mut stopwatch = StopwatchDriver::new(scheduler.clone(), interval);
            stopwatch.start();
            scheduler.advance(Duration::from_secs(1));
            assert_eq!(stopwatch.timer().accumulated_ms(), 1000, "{interval:?}");
        }
    }

    #[test]
    fn dropping_a_driver_releases_its_subscription() {
        let scheduler = TickScheduler::new();
        let mut stopwatch = StopwatchDriver::new(scheduler.clone(), Duration::from_millis(10));
        stopwatch.start();
        drop(stopwatch);
        assert_eq!(scheduler.subscription_count(), 0);
        scheduler.advance(Duration::from_secs(1));
    }

    #[test]
    fn countdown_finishes_once_and_disarms_itself() {
        let scheduler = TickScheduler::new();
        let finishes = Rc::new(Cell::new(0));
        let seen = Rc::clone(&finishes);
        let mut countdown = CountdownDriver::new(scheduler.clone(), move || seen.set(seen.get() + 1));

        countdown.configure(0, 1, 30).unwrap();
        countdown.start().unwrap();
        scheduler.advance(Duration::from_secs(89));
        assert_eq!(finishes.get(), 0);
        assert_eq!(countdown.timer().format_display(), "00:00:01");

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(finishes.get(), 1);
        assert!(countdown.timer().is_finished());
        assert!(!countdown.is_armed());
        assert_eq!(scheduler.subscription_count(), 0);

        scheduler.advance(Duration::from_secs(30));
        assert_eq!(finishes.get(), 1);
    }

    #[test]
    fn countdown_pause_and_reset_disarm() {
        let scheduler = TickScheduler::new();
        let mut countdown = CountdownDriver::new(scheduler.clone(), || {});
        countdown.configure(0, 0, 10).unwrap();
        countdown.start().unwrap();
        scheduler.advance(Duration::from_secs(3));

        countdown.pause();
        assert!(!countdown.is_armed());
        scheduler.advance(Duration::from_secs(3));
        assert_eq!(countdown.timer().remaining_ms(), 7000);

        countdown.start().unwrap();
        scheduler.advance(Duration::from_secs(2));
        countdown.reset();
        assert!(!countdown.is_armed());
        assert_eq!(countdown.timer().remaining_ms(), 0);
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn countdown_start_without_configuration_is_rejected() {
        let scheduler = TickScheduler::new();
        let mut countdown = CountdownDriver::new(scheduler.clone(), || {});
        assert!(countdown.start().is_err());
        assert!(countdown.configure(0, 0, 0).is_err());
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn alarm_driver_alerts_once_per_matching_minute() {
        let scheduler = TickScheduler::new();
        let clock = FixedClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(6, 59, 58)
                .unwrap(),
        );
        let mut matcher = ScheduleMatcher::load(MemoryStore::new());
        let id = matcher
            .add_rule(
                RuleDraft {
                    label: Some("Wake".to_string()),
                    ..RuleDraft::at("07:00")
                },
                DateTime::from_timestamp_millis(1).unwrap(),
            )
            .unwrap();
        let recorder = Recorder::granting();
        let alerter = Alerter::new(recorder.clone(), recorder.clone());

        let ticking = clock.clone();
        let _clock_feed = scheduler.subscribe(
            Duration::from_secs(1),
            Box::new(move || {
                ticking.advance(chrono::Duration::seconds(1));
                ControlFlow::Continue(())
            }),
        );
        let mut alarms = AlarmDriver::new(scheduler.clone(), matcher, clock, alerter);
        alarms.arm();
        alarms.arm();

        scheduler.advance(Duration::from_secs(120));
        let fired = alarms.drain_fired();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].rule.id, id);
        assert_eq!(
            recorder
                .entries()
                .iter()
                .filter(|entry| entry.starts_with("notify"))
                .count(),
            1
        );

        let due = alarms
            .with_matcher(|matcher| matcher.snooze(id, fired[0].at))
            .unwrap();
        assert_eq!(alarms.matcher().snoozed_until(id), Some(due));
        scheduler.advance(Duration::from_secs(5 * 60));
        let snoozed = alarms.drain_fired();
        assert_eq!(snoozed.len(), 1);
        assert_eq!(snoozed[0].reason, FireReason::Snoozed);

        alarms.disarm();
        assert!(!alarms.is_armed());
        assert_eq!(alarms.alerter().notifier().permission_requests.get(), 1);
    }
}
