//! Timer queue
//!
//! One-shot and repeating timers ordered by due time, each attributed to an
//! owner and a category so that every timer belonging to an actor can be
//! counted and cancelled at once.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use marionette_core::{ActorId, SceneTime, TimerId};

/// Shortest period a repeating timer may have
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Who a timer is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Actor(ActorId),
    Sequencer,
}

/// What a timer drives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerCategory {
    /// Mouth toggle interval
    Mouth,
    /// Eye blink interval
    Eye,
    /// Leg alternation interval
    Leg,
    /// Cue stop timer bounding a talking driver
    StageDuration,
    /// Generic animation timeout (tweens, fades)
    Animation,
    /// Sequencer step delays
    Sequencer,
}

impl TimerCategory {
    pub const ALL: [TimerCategory; 6] = [
        TimerCategory::Mouth,
        TimerCategory::Eye,
        TimerCategory::Leg,
        TimerCategory::StageDuration,
        TimerCategory::Animation,
        TimerCategory::Sequencer,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            TimerCategory::Mouth => 0,
            TimerCategory::Eye => 1,
            TimerCategory::Leg => 2,
            TimerCategory::StageDuration => 3,
            TimerCategory::Animation => 4,
            TimerCategory::Sequencer => 5,
        }
    }
}

impl fmt::Display for TimerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerCategory::Mouth => "mouth",
            TimerCategory::Eye => "eye",
            TimerCategory::Leg => "leg",
            TimerCategory::StageDuration => "stage-duration",
            TimerCategory::Animation => "animation",
            TimerCategory::Sequencer => "sequencer",
        };
        f.write_str(name)
    }
}

/// Per-category timer counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts([usize; 6]);

impl CategoryCounts {
    #[inline]
    pub fn get(&self, category: TimerCategory) -> usize {
        self.0[category.index()]
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimerCategory, usize)> + '_ {
        TimerCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    fn add(&mut self, category: TimerCategory) {
        self.0[category.index()] += 1;
    }

    fn remove(&mut self, category: TimerCategory) {
        let slot = &mut self.0[category.index()];
        *slot = slot.saturating_sub(1);
    }
}

/// Timer recurrence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recurrence {
    Once,
    Every(Duration),
}

#[derive(Debug)]
struct TimerEntry<T> {
    owner: TimerOwner,
    category: TimerCategory,
    recurrence: Recurrence,
    key: (SceneTime, u64),
    payload: T,
}

/// A timer that came due
#[derive(Clone, Debug, PartialEq)]
pub struct FiredTimer<T> {
    pub id: TimerId,
    pub owner: TimerOwner,
    pub category: TimerCategory,
    pub due: SceneTime,
    /// True if the timer re-armed itself and is still pending
    pub repeating: bool,
    pub payload: T,
}

/// Timer queue ordered by (due time, scheduling order)
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: HashMap<TimerId, TimerEntry<T>>,
    order: BTreeSet<(SceneTime, u64, TimerId)>,
    counts: HashMap<TimerOwner, CategoryCounts>,
    next_id: TimerId,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        TimerQueue {
            entries: HashMap::new(),
            order: BTreeSet::new(),
            counts: HashMap::new(),
            next_id: TimerId::new(1),
            next_seq: 0,
        }
    }

    /// Schedule a one-shot timer due at `due`
    pub fn schedule_at(
        &mut self,
        owner: TimerOwner,
        category: TimerCategory,
        due: SceneTime,
        payload: T,
    ) -> TimerId {
        self.insert(owner, category, Recurrence::Once, due, payload)
    }

    /// Schedule a repeating timer, first due at `first_due`
    pub fn schedule_every(
        &mut self,
        owner: TimerOwner,
        category: TimerCategory,
        first_due: SceneTime,
        period: Duration,
        payload: T,
    ) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(owner, category, Recurrence::Every(period), first_due, payload)
    }

    fn insert(
        &mut self,
        owner: TimerOwner,
        category: TimerCategory,
        recurrence: Recurrence,
        due: SceneTime,
        payload: T,
    ) -> TimerId {
        let id = self.next_id;
        self.next_id = id.next();
        let key = (due, self.bump_seq());
        self.order.insert((key.0, key.1, id));
        self.counts.entry(owner).or_default().add(category);
        self.entries.insert(
            id,
            TimerEntry {
                owner,
                category,
                recurrence,
                key,
                payload,
            },
        );
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel a timer. Unknown or already fired ids are a no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.order.remove(&(entry.key.0, entry.key.1, id));
        self.release_count(entry.owner, entry.category);
        true
    }

    /// Cancel every timer attributed to `owner`
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> CategoryCounts {
        let ids: Vec<TimerId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.owner == owner)
            .map(|(id, _)| *id)
            .collect();

        let mut cleared = CategoryCounts::default();
        for id in ids {
            if let Some(entry) = self.entries.remove(&id) {
                self.order.remove(&(entry.key.0, entry.key.1, id));
                cleared.add(entry.category);
            }
        }
        self.counts.remove(&owner);

        if !cleared.is_empty() {
            tracing::trace!(?owner, cleared = cleared.total(), "cancelled owner timers");
        }
        cleared
    }

    fn release_count(&mut self, owner: TimerOwner, category: TimerCategory) {
        if let Some(counts) = self.counts.get_mut(&owner) {
            counts.remove(category);
            if counts.is_empty() {
                self.counts.remove(&owner);
            }
        }
    }

    /// Number of pending timers attributed to `owner`
    pub fn pending_for(&self, owner: TimerOwner) -> usize {
        self.counts.get(&owner).map(|c| c.total()).unwrap_or(0)
    }

    /// Number of pending timers of one category attributed to `owner`
    pub fn pending_in(&self, owner: TimerOwner, category: TimerCategory) -> usize {
        self.counts.get(&owner).map(|c| c.get(category)).unwrap_or(0)
    }

    /// Per-category counts for `owner`
    pub fn census(&self, owner: TimerOwner) -> CategoryCounts {
        self.counts.get(&owner).copied().unwrap_or_default()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<SceneTime> {
        self.order.first().map(|(due, _, _)| *due)
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pop the earliest timer due at or before `deadline`.
    /// Repeating timers are re-armed at `due + period` behind any timer
    /// already scheduled for that instant.
    pub fn pop_due(&mut self, deadline: SceneTime) -> Option<FiredTimer<T>> {
        let &(due, seq, id) = self.order.first()?;
        if due > deadline {
            return None;
        }
        self.order.remove(&(due, seq, id));

        let recurrence = self.entries.get(&id)?.recurrence;
        match recurrence {
            Recurrence::Once => {
                let entry = self.entries.remove(&id)?;
                self.release_count(entry.owner, entry.category);
                Some(FiredTimer {
                    id,
                    owner: entry.owner,
                    category: entry.category,
                    due,
                    repeating: false,
                    payload: entry.payload,
                })
            }
            Recurrence::Every(period) => {
                let next_key = (due + period, self.bump_seq());
                let entry = self.entries.get_mut(&id)?;
                entry.key = next_key;
                self.order.insert((next_key.0, next_key.1, id));
                Some(FiredTimer {
                    id,
                    owner: entry.owner,
                    category: entry.category,
                    due,
                    repeating: true,
                    payload: entry.payload.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALEX: TimerOwner = TimerOwner::Actor(ActorId(1));
    const CRIS: TimerOwner = TimerOwner::Actor(ActorId(2));

    fn at(ms: u64) -> SceneTime {
        SceneTime::from_millis(ms)
    }

    #[test]
    fn test_pops_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ALEX, TimerCategory::Animation, at(300), "c");
        queue.schedule_at(ALEX, TimerCategory::Animation, at(100), "a");
        queue.schedule_at(CRIS, TimerCategory::Animation, at(200), "b");

        let mut fired = Vec::new();
        while let Some(t) = queue.pop_due(at(1000)) {
            fired.push(t.payload);
        }
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_due_times_are_fifo() {
        let mut queue = TimerQueue::new();
        for name in ["first", "second", "third"] {
            queue.schedule_at(ALEX, TimerCategory::Sequencer, at(50), name);
        }
        let order: Vec<_> = std::iter::from_fn(|| queue.pop_due(at(50)))
            .map(|t| t.payload)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_deadline_respected() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ALEX, TimerCategory::StageDuration, at(1000), ());
        assert!(queue.pop_due(at(999)).is_none());
        assert!(queue.pop_due(at(1000)).is_some());
    }

    #[test]
    fn test_repeating_timer_rearms() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_every(ALEX, TimerCategory::Mouth, at(150), Duration::from_millis(150), ());

        let dues: Vec<_> = std::iter::from_fn(|| queue.pop_due(at(600)))
            .map(|t| {
                assert!(t.repeating);
                assert_eq!(t.id, id);
                t.due.as_millis()
            })
            .collect();
        assert_eq!(dues, vec![150, 300, 450, 600]);
        assert_eq!(queue.pending_in(ALEX, TimerCategory::Mouth), 1);
        assert_eq!(queue.next_due(), Some(at(750)));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        let id = queue.schedule_at(ALEX, TimerCategory::Eye, at(10), ());
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(!queue.cancel(TimerId::new(999)));
        assert_eq!(queue.pending_for(ALEX), 0);
        assert!(queue.pop_due(at(100)).is_none());
    }

    #[test]
    fn test_cancel_owner_clears_every_category() {
        let mut queue = TimerQueue::new();
        let period = Duration::from_millis(100);
        queue.schedule_every(ALEX, TimerCategory::Mouth, at(100), period, ());
        queue.schedule_every(ALEX, TimerCategory::Eye, at(300), period, ());
        queue.schedule_at(ALEX, TimerCategory::StageDuration, at(1000), ());
        queue.schedule_at(ALEX, TimerCategory::Animation, at(500), ());
        queue.schedule_every(CRIS, TimerCategory::Leg, at(200), period, ());

        let cleared = queue.cancel_owner(ALEX);
        assert_eq!(cleared.total(), 4);
        assert_eq!(cleared.get(TimerCategory::Mouth), 1);
        assert_eq!(cleared.get(TimerCategory::Leg), 0);
        assert_eq!(queue.pending_for(ALEX), 0);
        assert_eq!(queue.pending_for(CRIS), 1);

        // Only CRIS's timer remains
        let fired = queue.pop_due(at(10_000)).unwrap();
        assert_eq!(fired.owner, CRIS);
    }

    #[test]
    fn test_cancel_owner_without_timers_is_noop() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        assert!(queue.cancel_owner(ALEX).is_empty());
        assert!(queue.cancel_owner(TimerOwner::Sequencer).is_empty());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut queue = TimerQueue::new();
        queue.schedule_every(ALEX, TimerCategory::Leg, at(0), Duration::ZERO, ());
        let first = queue.pop_due(at(0)).unwrap();
        assert_eq!(first.due, at(0));
        // Re-armed one minimum period later, so a zero deadline cannot spin
        assert!(queue.pop_due(at(0)).is_none());
    }

    #[test]
    fn test_census_matches_pending() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(CRIS, TimerCategory::Animation, at(5), ());
        queue.schedule_at(CRIS, TimerCategory::Animation, at(6), ());
        let census = queue.census(CRIS);
        assert_eq!(census.get(TimerCategory::Animation), 2);
        assert_eq!(census.total(), queue.pending_for(CRIS));
        queue.pop_due(at(5));
        assert_eq!(queue.pending_in(CRIS, TimerCategory::Animation), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_fired_times_never_decrease(dues in proptest::collection::vec(0u64..5_000, 1..40)) {
                let mut queue = TimerQueue::new();
                for (i, due) in dues.iter().enumerate() {
                    let owner = if i % 2 == 0 { ALEX } else { CRIS };
                    queue.schedule_at(owner, TimerCategory::Animation, at(*due), i);
                }
                let mut last = SceneTime::ZERO;
                let mut count = 0;
                while let Some(t) = queue.pop_due(at(5_000)) {
                    prop_assert!(t.due >= last);
                    last = t.due;
                    count += 1;
                }
                prop_assert_eq!(count, dues.len());
                prop_assert_eq!(queue.pending_for(ALEX) + queue.pending_for(CRIS), 0);
            }
        }
    }
}
