//! Timer engine - pairs the scene clock with the timer queue

use std::time::Duration;

use marionette_core::{SceneTime, TimerId};

use crate::{CategoryCounts, FiredTimer, SceneClock, TimerCategory, TimerOwner, TimerQueue};

/// Timer engine: schedules relative to the scene clock and drains due timers
#[derive(Debug)]
pub struct TimerEngine<T> {
    clock: SceneClock,
    queue: TimerQueue<T>,
}

impl<T> Default for TimerEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerEngine<T> {
    pub fn new() -> Self {
        TimerEngine {
            clock: SceneClock::new(),
            queue: TimerQueue::new(),
        }
    }

    /// Current scene time
    #[inline]
    pub fn now(&self) -> SceneTime {
        self.clock.now()
    }

    /// One-shot timer `delay` from now
    pub fn after(
        &mut self,
        owner: TimerOwner,
        category: TimerCategory,
        delay: Duration,
        payload: T,
    ) -> TimerId {
        let due = self.clock.now() + delay;
        self.queue.schedule_at(owner, category, due, payload)
    }

    /// Repeating timer, first firing one `period` from now
    pub fn every(
        &mut self,
        owner: TimerOwner,
        category: TimerCategory,
        period: Duration,
        payload: T,
    ) -> TimerId {
        let first_due = self.clock.now() + period;
        self.queue
            .schedule_every(owner, category, first_due, period, payload)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id)
    }

    pub fn cancel_owner(&mut self, owner: TimerOwner) -> CategoryCounts {
        self.queue.cancel_owner(owner)
    }

    pub fn pending_for(&self, owner: TimerOwner) -> usize {
        self.queue.pending_for(owner)
    }

    pub fn pending_in(&self, owner: TimerOwner, category: TimerCategory) -> usize {
        self.queue.pending_in(owner, category)
    }

    pub fn census(&self, owner: TimerOwner) -> CategoryCounts {
        self.queue.census(owner)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.contains(id)
    }

    pub fn queue(&self) -> &TimerQueue<T> {
        &self.queue
    }
}

impl<T: Clone> TimerEngine<T> {
    /// Pop the next timer due at or before `deadline`, moving the clock to its
    /// due time. When nothing is due the clock moves to `deadline` and `None`
    /// is returned.
    pub fn pop_until(&mut self, deadline: SceneTime) -> Option<FiredTimer<T>> {
        match self.queue.pop_due(deadline) {
            Some(fired) => {
                self.clock.advance_to(fired.due);
                Some(fired)
            }
            None => {
                self.clock.advance_to(deadline);
                None
            }
        }
    }
}
