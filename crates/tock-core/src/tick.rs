//! Periodic tick subscriptions.
//!
//! Components never own timers. Whoever owns a component subscribes a callback
//! to a [`TickSource`] and keeps the returned [`TickHandle`]; cancelling (or
//! dropping) the handle guarantees the callback never runs again.
//!
//! [`TickScheduler`] is a single-threaded, virtual-time implementation. Tests
//! advance it directly; the CLI advances it from a real-time loop.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Callback invoked on every tick. Returning `Break` ends the subscription.
pub type TickCallback = Box<dyn FnMut() -> ControlFlow<()>>;

/// Something that can deliver periodic callbacks.
pub trait TickSource {
    /// Registers `callback` to run every `interval`, first after one interval.
    fn subscribe(&self, interval: Duration, callback: TickCallback) -> TickHandle;
}

/// Ownership of one tick subscription.
///
/// Release is idempotent and also happens on drop.
#[must_use = "dropping the handle cancels the subscription"]
pub struct TickHandle {
    id: u64,
    active: Rc<Cell<bool>>,
    registry: Weak<RefCell<SchedulerState>>,
}

impl TickHandle {
    /// Stops the subscription. Safe to call any number of times, including from
    /// inside a tick callback.
    pub fn cancel(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            // A callback currently running holds no borrow, so this only fails
            // when called re-entrantly from the scheduler itself.
            if let Ok(mut state) = registry.try_borrow_mut() {
                state.subscriptions.remove(&self.id);
            }
        }
        tracing::trace!(subscription = self.id, "tick subscription cancelled");
    }

    /// Whether the subscription can still fire.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

struct Subscription {
    interval: Duration,
    next_due: Duration,
    active: Rc<Cell<bool>>,
    callback: Rc<RefCell<TickCallback>>,
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    subscriptions: BTreeMap<u64, Subscription>,
}

impl SchedulerState {
    /// Earliest due subscription at or before `limit`, ties broken by
    /// subscription order.
    fn earliest_due(&self, limit: Duration) -> Option<u64> {
        self.subscriptions
            .iter()
            .filter(|(_, sub)| sub.next_due <= limit)
            .min_by_key(|(id, sub)| (sub.next_due, **id))
            .map(|(id, _)| *id)
    }
}

/// Virtual-time tick source.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone, Default)]
pub struct TickScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Deadline of the next pending tick, if anything is subscribed.
    pub fn next_due(&self) -> Option<Duration> {
        self.state
            .borrow()
            .subscriptions
            .values()
            .map(|sub| sub.next_due)
            .min()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    /// Advances virtual time by `by`, firing every tick that falls due.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Advances virtual time to `target`, firing due ticks in deadline order.
    /// Returns the number of callbacks run.
    ///
    /// Callbacks may subscribe and cancel freely, but must not advance the
    /// scheduler themselves.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let (id, active, callback) = {
                let mut state = self.state.borrow_mut();
                let Some(id) = state.earliest_due(target) else {
                    break;
                };
                let Some(sub) = state.subscriptions.get_mut(&id) else {
                    break;
                };
                let due = sub.next_due;
                sub.next_due = due.saturating_add(sub.interval);
                let picked = (id, Rc::clone(&sub.active), Rc::clone(&sub.callback));
                state.now = due;
                picked
            };

            if !active.get() {
                self.state.borrow_mut().subscriptions.remove(&id);
                continue;
            }
            let flow = match callback.try_borrow_mut() {
                Ok(mut callback) => (callback)(),
                Err(_) => {
                    tracing::warn!(subscription = id, "tick callback re-entered; skipping");
                    ControlFlow::Continue(())
                }
            };
            fired += 1;

            if flow.is_break() {
                active.set(false);
                self.state.borrow_mut().subscriptions.remove(&id);
            }
        }

        let mut state = self.state.borrow_mut();
        if state.now < target {
            state.now = target;
        }
        fired
    }
}

impl TickSource for TickScheduler {
    fn subscribe(&self, interval: Duration, callback: TickCallback) -> TickHandle {
        let interval = interval.max(Duration::from_millis(1));
        let active = Rc::new(Cell::new(true));
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let next_due = state.now.saturating_add(interval);
        state.subscriptions.insert(
            id,
            Subscription {
                interval,
                next_due,
                active: Rc::clone(&active),
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        tracing::trace!(subscription = id, ?interval, "tick subscription armed");
        TickHandle {
            id,
            active,
            registry: Rc::downgrade(&self.state),
        }
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TickScheduler")
            .field("now", &state.now)
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(source: &TickScheduler, interval_ms: u64) -> (Rc<Cell<u32>>, TickHandle) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let handle = source.subscribe(
            Duration::from_millis(interval_ms),
            Box::new(move || {
                seen.set(seen.get() + 1);
                ControlFlow::Continue(())
            }),
        );
        (count, handle)
    }

    #[test]
    fn fires_once_per_elapsed_interval() {
        let scheduler = TickScheduler::new();
        let (count, _handle) = counter(&scheduler, 10);

        scheduler.advance(Duration::from_millis(95));
        assert_eq!(count.get(), 9);
        scheduler.advance(Duration::from_millis(5));
        assert_eq!(count.get(), 10);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(110)));
    }

    #[test]
    fn cancel_is_idempotent_and_final() {
        let scheduler = TickScheduler::new();
        let (count, handle) = counter(&scheduler, 1000);

        scheduler.advance(Duration::from_secs(2));
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
        scheduler.advance(Duration::from_secs(5));

        assert_eq!(count.get(), 2);
        assert_eq!(scheduler.subscription_count(), 0);
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn dropping_the_handle_cancels() {
        let scheduler = TickScheduler::new();
        let (count, handle) = counter(&scheduler, 10);
        drop(handle);
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn break_ends_the_subscription() {
        let scheduler = TickScheduler::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let handle = scheduler.subscribe(
            Duration::from_secs(1),
            Box::new(move || {
                seen.set(seen.get() + 1);
                if seen.get() == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }),
        );

        assert_eq!(scheduler.advance(Duration::from_secs(10)), 3);
        assert_eq!(count.get(), 3);
        assert!(!handle.is_active());
        handle.cancel();
    }

    #[test]
    fn cancel_from_another_callback_in_same_pass() {
        let scheduler = TickScheduler::new();
        let victim: Rc<RefCell<Option<TickHandle>>> = Rc::new(RefCell::new(None));

        let killer_target = Rc::clone(&victim);
        let _killer = scheduler.subscribe(
            Duration::from_millis(100),
            Box::new(move || {
                if let Some(handle) = killer_target.borrow_mut().take() {
                    handle.cancel();
                }
                ControlFlow::Continue(())
            }),
        );
        let (count, handle) = counter(&scheduler, 100);
        *victim.borrow_mut() = Some(handle);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn interleaves_subscriptions_in_deadline_order() {
        let scheduler = TickScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let mut handles = Vec::new();
        for (name, interval) in [("slow", 300), ("fast", 100)] {
            let order = Rc::clone(&order);
            handles.push(scheduler.subscribe(
                Duration::from_millis(interval),
                Box::new(move || {
                    order.borrow_mut().push(name);
                    ControlFlow::Continue(())
                }),
            ));
        }

        scheduler.advance(Duration::from_millis(300));
        assert_eq!(*order.borrow(), vec!["fast", "fast", "slow", "fast"]);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let scheduler = TickScheduler::new();
        let (count, _handle) = counter(&scheduler, 0);
        scheduler.advance(Duration::from_millis(5));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn handle_outliving_scheduler_cancels_quietly() {
        let scheduler = TickScheduler::new();
        let (_, handle) = counter(&scheduler, 10);
        drop(scheduler);
        handle.cancel();
        assert!(!handle.is_active());
    }
}
