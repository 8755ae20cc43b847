//! Drives a virtual tick scheduler from the real clock.

use tokio::time::Instant;
use tock_core::TickScheduler;

/// Keeps a [`TickScheduler`]'s virtual time in step with elapsed real time.
pub struct RealTime {
    scheduler: TickScheduler,
    origin: Instant,
}

impl RealTime {
    pub fn new(scheduler: TickScheduler) -> Self {
        Self {
            scheduler,
            origin: Instant::now(),
        }
    }

    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Fires every tick that is due by now.
    ///
    /// Call before acting on user input, so subscriptions armed in response
    /// start counting from the present rather than from the last tick.
    pub fn catch_up(&self) -> usize {
        self.scheduler.advance_to(self.origin.elapsed())
    }

    /// Waits for the next tick and fires it. Never resolves while nothing is
    /// subscribed.
    ///
    /// Cancel-safe: dropping the future before it resolves fires nothing.
    pub async fn tick(&self) -> usize {
        let Some(due) = self.scheduler.next_due() else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(self.origin + due).await;
        self.catch_up()
    }
}
