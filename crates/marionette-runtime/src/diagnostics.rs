//! Diagnostics hook
//!
//! Keeps the most recent [`EngineEvent`]s of a scene in a bounded buffer and
//! mirrors each one to `tracing`. Ignored triggers and dropped cascade steps
//! never surface as errors; this is where tests observe them.

use std::collections::VecDeque;

use marionette_core::{ActorId, EngineEvent, Stage};
use tracing::{debug, trace, warn};

/// Bounded buffer of diagnostic events
#[derive(Debug)]
pub struct Diagnostics {
    events: VecDeque<EngineEvent>,
    capacity: usize,
    /// Events evicted because the buffer was full
    evicted: u64,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Diagnostics {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// Record an event, evicting the oldest one when full
    pub fn record(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::StageChanged {
                actor,
                from,
                to,
                at,
                pending_after_cleanup,
            } => debug!(
                actor = %actor,
                from = %from,
                to = %to,
                at_ms = at.as_millis(),
                pending = pending_after_cleanup,
                "stage changed"
            ),
            EngineEvent::TriggerIgnored { actor, trigger, stage, .. } => {
                debug!(actor = %actor, trigger = %trigger, stage = %stage, "trigger ignored")
            }
            EngineEvent::PlaybackFailed { actor, cue, reason, .. } => {
                warn!(actor = %actor, cue = %cue, reason = %reason, "playback failed, continuing on cue duration")
            }
            EngineEvent::CascadeDropped { actor, stage, .. } => {
                warn!(actor = %actor, stage = %stage, "disappear step dropped")
            }
            other => trace!(event = ?other, "engine event"),
        }

        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(event);
    }

    pub fn events(&self) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter()
    }

    /// Events about one actor
    pub fn for_actor(&self, actor: ActorId) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter().filter(move |e| e.actor() == Some(actor))
    }

    /// Stage timeline of one actor as (from, to) pairs
    pub fn transitions(&self, actor: ActorId) -> Vec<(Stage, Stage)> {
        self.for_actor(actor)
            .filter_map(|e| match e {
                EngineEvent::StageChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    /// Count events matching a predicate
    pub fn count(&self, predicate: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{SceneTime, TriggerKind};

    fn change(actor: u64, from: Stage, to: Stage) -> EngineEvent {
        EngineEvent::StageChanged {
            actor: ActorId::new(actor),
            from,
            to,
            at: SceneTime::ZERO,
            pending_after_cleanup: 0,
        }
    }

    #[test]
    fn test_bounded_buffer() {
        let mut diagnostics = Diagnostics::new(2);
        diagnostics.record(change(1, Stage::Initial, Stage::Hola));
        diagnostics.record(change(1, Stage::Hola, Stage::Walking));
        diagnostics.record(change(1, Stage::Walking, Stage::Talking));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.evicted(), 1);
        assert_eq!(
            diagnostics.transitions(ActorId::new(1)),
            vec![(Stage::Hola, Stage::Walking), (Stage::Walking, Stage::Talking)]
        );
    }

    #[test]
    fn test_filters() {
        let mut diagnostics = Diagnostics::new(16);
        diagnostics.record(change(1, Stage::Initial, Stage::Hola));
        diagnostics.record(change(2, Stage::Initial, Stage::Walking));
        diagnostics.record(EngineEvent::TriggerIgnored {
            actor: ActorId::new(2),
            trigger: TriggerKind::Disappear,
            stage: Stage::Walking,
            at: SceneTime::from_millis(5),
        });

        assert_eq!(diagnostics.for_actor(ActorId::new(2)).count(), 2);
        assert_eq!(
            diagnostics.count(|e| matches!(e, EngineEvent::TriggerIgnored { .. })),
            1
        );
        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }
}
