//! Sequencer
//!
//! Cross-actor orchestration as data. The entrance chain and the
//! disappearance cascade are both lists of [`SequencerStep`]s; delayed steps
//! are ordinary timers owned by [`TimerOwner::Sequencer`], so a single loop
//! (the scene's timer dispatch) consumes them in order.
//!
//! Entrance: each actor's entrance completion schedules the next actor's
//! start after that link's delay, giving a total order. Cascade: one trigger
//! fans out to every listed actor, the first immediately and the rest
//! `stagger` apart. Starts are staggered, completions may overlap. "All gone"
//! is emitted once, after every cascade actor reported its disappearance.
//!
//! Actors that already left before the cascade count as gone, and one still
//! fading out is awaited. A cascade step that reaches an actor that never
//! settled is dropped and recorded; that actor keeps the aggregate open, so
//! "all gone" is never emitted for that cascade.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use marionette_core::{ActorId, MarionetteError, MarionetteResult, SceneTime};
use marionette_time::{TimerCategory, TimerEngine, TimerOwner};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::scene::{SceneSignal, SceneTimer};
use crate::script::ScriptPart;

/// One sequencer step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequencerStep {
    /// Pulse an actor's start trigger
    Start(ActorId),
    /// Pulse an actor's disappear trigger
    Disappear(ActorId),
}

impl SequencerStep {
    pub fn actor(&self) -> ActorId {
        match self {
            SequencerStep::Start(actor) | SequencerStep::Disappear(actor) => *actor,
        }
    }
}

/// What the scene should do next on behalf of the sequencer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Dispatch a step now
    Dispatch(SequencerStep),
    /// Emit a scene signal
    Emit(SceneSignal),
}

/// Static description of a scene's choreography
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choreography {
    /// Entrance order
    pub entrance: Vec<ActorId>,
    /// Delay of each entrance link; missing entries use the configured default
    #[serde(rename = "delays_ms", with = "marionette_core::millis::list")]
    pub delays: Vec<Duration>,
    /// Delay from mount to the first start. `None` leaves the first start to
    /// the host's trigger.
    #[serde(rename = "lead_in_ms", with = "marionette_core::millis::option")]
    pub lead_in: Option<Duration>,
    /// Cascade order; empty means the entrance order reversed
    pub cascade: Vec<ActorId>,
    #[serde(rename = "stagger_ms", with = "marionette_core::millis::option")]
    pub stagger: Option<Duration>,
}

impl Choreography {
    /// Entrance chain with explicit link delays
    pub fn chain(entrance: Vec<ActorId>, delays: Vec<Duration>) -> Self {
        Choreography {
            entrance,
            delays,
            ..Self::default()
        }
    }

    pub fn with_lead_in(mut self, lead_in: Duration) -> Self {
        self.lead_in = Some(lead_in);
        self
    }

    pub fn with_cascade(mut self, cascade: Vec<ActorId>, stagger: Duration) -> Self {
        self.cascade = cascade;
        self.stagger = Some(stagger);
        self
    }

    /// Check the choreography against the scene's actors
    pub fn validate(&self, actors: &HashSet<ActorId>) -> MarionetteResult<()> {
        for (name, list) in [("entrance", &self.entrance), ("cascade", &self.cascade)] {
            let mut seen = HashSet::new();
            for actor in list {
                if !actors.contains(actor) {
                    return Err(MarionetteError::InvalidChoreography(format!(
                        "{} names unknown actor {}",
                        name, actor
                    )));
                }
                if !seen.insert(*actor) {
                    return Err(MarionetteError::InvalidChoreography(format!(
                        "{} lists actor {} twice",
                        name, actor
                    )));
                }
            }
        }
        if self.delays.len() > self.entrance.len().saturating_sub(1) {
            return Err(MarionetteError::InvalidChoreography(format!(
                "{} delays for {} entrance links",
                self.delays.len(),
                self.entrance.len().saturating_sub(1)
            )));
        }
        if self.lead_in.is_some() && self.entrance.is_empty() {
            return Err(MarionetteError::InvalidChoreography(
                "lead-in without an entrance".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sequencer state of one scene
#[derive(Debug)]
pub struct Sequencer {
    entrance: Vec<ActorId>,
    /// One delay per entrance link
    delays: Vec<Duration>,
    lead_in: Option<Duration>,
    cascade: Vec<ActorId>,
    stagger: Duration,
    mounted: bool,
    cascade_started: Option<SceneTime>,
    /// Cascade actors that have not reported their disappearance
    awaiting: BTreeSet<ActorId>,
    /// Every actor that reported its disappearance, before or after the cascade
    reported: BTreeSet<ActorId>,
    dropped: BTreeSet<ActorId>,
    all_gone: bool,
}

impl Sequencer {
    /// Resolve a choreography against configuration defaults
    pub fn new(choreography: Choreography, config: &EngineConfig) -> Self {
        let links = choreography.entrance.len().saturating_sub(1);
        let mut delays = choreography.delays;
        delays.resize(links, config.entrance_delay);

        let cascade = if choreography.cascade.is_empty() {
            choreography.entrance.iter().rev().copied().collect()
        } else {
            choreography.cascade
        };

        Sequencer {
            entrance: choreography.entrance,
            delays,
            lead_in: choreography.lead_in,
            cascade,
            stagger: choreography.stagger.unwrap_or(config.cascade_stagger),
            mounted: false,
            cascade_started: None,
            awaiting: BTreeSet::new(),
            reported: BTreeSet::new(),
            dropped: BTreeSet::new(),
            all_gone: false,
        }
    }

    pub fn entrance(&self) -> &[ActorId] {
        &self.entrance
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn cascade(&self) -> &[ActorId] {
        &self.cascade
    }

    pub fn stagger(&self) -> Duration {
        self.stagger
    }

    /// Scene time the cascade was triggered at
    pub fn cascade_started(&self) -> Option<SceneTime> {
        self.cascade_started
    }

    pub fn awaiting(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.awaiting.iter().copied()
    }

    pub fn dropped(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.dropped.iter().copied()
    }

    pub fn is_all_gone(&self) -> bool {
        self.all_gone
    }

    /// Scene mounted: start the lead-in, if any. Runs once.
    pub fn mount(&mut self, engine: &mut TimerEngine<SceneTimer>) -> Option<Directive> {
        if self.mounted {
            return None;
        }
        self.mounted = true;

        let first = *self.entrance.first()?;
        match self.lead_in? {
            lead_in if lead_in.is_zero() => Some(Directive::Dispatch(SequencerStep::Start(first))),
            lead_in => {
                schedule(engine, lead_in, SequencerStep::Start(first));
                None
            }
        }
    }

    /// React to an actor signal
    pub fn on_signal(
        &mut self,
        signal: &SceneSignal,
        engine: &mut TimerEngine<SceneTimer>,
    ) -> Option<Directive> {
        match signal {
            SceneSignal::Completed {
                actor,
                part: ScriptPart::Entrance,
                ..
            } => {
                let index = self.entrance.iter().position(|a| a == actor)?;
                let next = *self.entrance.get(index + 1)?;
                let delay = self.delays[index];
                debug!(from = %actor, to = %next, delay_ms = delay.as_millis() as u64, "entrance handoff");
                schedule(engine, delay, SequencerStep::Start(next));
                None
            }
            SceneSignal::DisappearComplete { actor, at } => {
                self.reported.insert(*actor);
                if self.cascade_started.is_none() || !self.awaiting.remove(actor) {
                    return None;
                }
                if self.awaiting.is_empty() && !self.all_gone {
                    self.all_gone = true;
                    info!(at_ms = at.as_millis(), "all actors gone");
                    return Some(Directive::Emit(SceneSignal::AllGone { at: *at }));
                }
                None
            }
            _ => None,
        }
    }

    /// Cascade trigger: fan out disappear steps. Runs once.
    ///
    /// Actors that already reported their disappearance are skipped; the
    /// remaining ones are staggered in cascade order.
    pub fn begin_cascade(&mut self, engine: &mut TimerEngine<SceneTimer>) -> Option<Directive> {
        if self.cascade_started.is_some() {
            return None;
        }
        let now = engine.now();
        self.cascade_started = Some(now);
        let pending: Vec<ActorId> = self
            .cascade
            .iter()
            .copied()
            .filter(|actor| !self.reported.contains(actor))
            .collect();
        self.awaiting = pending.iter().copied().collect();
        info!(
            actors = pending.len(),
            already_gone = self.cascade.len() - pending.len(),
            stagger_ms = self.stagger.as_millis() as u64,
            "cascade started"
        );

        let Some((&first, rest)) = pending.split_first() else {
            self.all_gone = true;
            info!(at_ms = now.as_millis(), "all actors gone");
            return Some(Directive::Emit(SceneSignal::AllGone { at: now }));
        };
        for (i, &actor) in rest.iter().enumerate() {
            let delay = self.stagger * (i as u32 + 1);
            schedule(engine, delay, SequencerStep::Disappear(actor));
        }
        Some(Directive::Dispatch(SequencerStep::Disappear(first)))
    }

    /// A disappear step reached an actor that could not disappear
    pub fn record_dropped(&mut self, actor: ActorId) {
        self.dropped.insert(actor);
    }
}

fn schedule(engine: &mut TimerEngine<SceneTimer>, delay: Duration, step: SequencerStep) {
    engine.after(
        TimerOwner::Sequencer,
        TimerCategory::Sequencer,
        delay,
        SceneTimer::Step(step),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ActorId> {
        raw.iter().copied().map(ActorId::new).collect()
    }

    fn drain(engine: &mut TimerEngine<SceneTimer>, ms: u64) -> Vec<(u64, SequencerStep)> {
        let mut steps = Vec::new();
        while let Some(fired) = engine.pop_until(SceneTime::from_millis(ms)) {
            if let SceneTimer::Step(step) = fired.payload {
                steps.push((fired.due.as_millis(), step));
            }
        }
        steps
    }

    #[test]
    fn test_defaults_fill_in() {
        let config = EngineConfig::default();
        let sequencer = Sequencer::new(
            Choreography::chain(ids(&[1, 2, 3]), vec![Duration::from_millis(500)]),
            &config,
        );
        assert_eq!(
            sequencer.delays(),
            &[Duration::from_millis(500), Duration::from_millis(2000)]
        );
        assert_eq!(sequencer.cascade(), ids(&[3, 2, 1]).as_slice());
        assert_eq!(sequencer.stagger(), Duration::from_millis(500));
    }

    #[test]
    fn test_entrance_handoff_uses_link_delay() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(
            Choreography::chain(
                ids(&[1, 2, 3]),
                vec![Duration::from_millis(2000), Duration::from_millis(1500)],
            ),
            &EngineConfig::default(),
        );

        drain(&mut engine, 1000);
        let completed = SceneSignal::Completed {
            actor: ActorId::new(1),
            part: ScriptPart::Entrance,
            at: SceneTime::from_millis(1000),
        };
        assert_eq!(sequencer.on_signal(&completed, &mut engine), None);
        assert_eq!(
            drain(&mut engine, 10_000),
            vec![(3000, SequencerStep::Start(ActorId::new(2)))]
        );

        // the last actor has no successor; continuations do not hand off
        let last = SceneSignal::Completed {
            actor: ActorId::new(3),
            part: ScriptPart::Entrance,
            at: SceneTime::from_millis(10_000),
        };
        sequencer.on_signal(&last, &mut engine);
        let encore = SceneSignal::Completed {
            actor: ActorId::new(2),
            part: ScriptPart::Continuation,
            at: SceneTime::from_millis(10_000),
        };
        sequencer.on_signal(&encore, &mut engine);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn test_lead_in() {
        let config = EngineConfig::default();
        let mut engine = TimerEngine::new();
        let mut immediate = Sequencer::new(
            Choreography::chain(ids(&[4, 5]), vec![]).with_lead_in(Duration::ZERO),
            &config,
        );
        assert_eq!(
            immediate.mount(&mut engine),
            Some(Directive::Dispatch(SequencerStep::Start(ActorId::new(4))))
        );
        assert_eq!(immediate.mount(&mut engine), None);

        let mut delayed = Sequencer::new(
            Choreography::chain(ids(&[4, 5]), vec![]).with_lead_in(Duration::from_millis(250)),
            &config,
        );
        assert_eq!(delayed.mount(&mut engine), None);
        assert_eq!(
            drain(&mut engine, 1000),
            vec![(250, SequencerStep::Start(ActorId::new(4)))]
        );

        let mut manual = Sequencer::new(Choreography::chain(ids(&[4, 5]), vec![]), &config);
        assert_eq!(manual.mount(&mut engine), None);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn test_cascade_staggers_starts() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(
            Choreography::default().with_cascade(ids(&[10, 11, 12]), Duration::from_millis(500)),
            &EngineConfig::default(),
        );

        assert_eq!(
            sequencer.begin_cascade(&mut engine),
            Some(Directive::Dispatch(SequencerStep::Disappear(ActorId::new(10))))
        );
        assert_eq!(sequencer.begin_cascade(&mut engine), None);
        assert_eq!(
            drain(&mut engine, 5000),
            vec![
                (500, SequencerStep::Disappear(ActorId::new(11))),
                (1000, SequencerStep::Disappear(ActorId::new(12))),
            ]
        );
    }

    #[test]
    fn test_all_gone_once_every_actor_reported() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(
            Choreography::default().with_cascade(ids(&[1, 2]), Duration::from_millis(500)),
            &EngineConfig::default(),
        );
        let gone = |id: u64, ms: u64| SceneSignal::DisappearComplete {
            actor: ActorId::new(id),
            at: SceneTime::from_millis(ms),
        };

        // 1 left before the cascade; only 2 gets a step
        assert_eq!(sequencer.on_signal(&gone(1, 10), &mut engine), None);
        assert_eq!(
            sequencer.begin_cascade(&mut engine),
            Some(Directive::Dispatch(SequencerStep::Disappear(ActorId::new(2))))
        );
        assert!(engine.queue().is_empty());
        assert_eq!(sequencer.awaiting().collect::<Vec<_>>(), ids(&[2]));

        assert_eq!(
            sequencer.on_signal(&gone(2, 1500), &mut engine),
            Some(Directive::Emit(SceneSignal::AllGone {
                at: SceneTime::from_millis(1500)
            }))
        );
        assert_eq!(sequencer.on_signal(&gone(1, 1700), &mut engine), None);
        assert!(sequencer.is_all_gone());
    }

    #[test]
    fn test_cascade_after_everyone_left_is_immediately_gone() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(
            Choreography::default().with_cascade(ids(&[1, 2]), Duration::from_millis(500)),
            &EngineConfig::default(),
        );
        for id in [1, 2] {
            let gone = SceneSignal::DisappearComplete {
                actor: ActorId::new(id),
                at: SceneTime::ZERO,
            };
            assert_eq!(sequencer.on_signal(&gone, &mut engine), None);
        }
        assert_eq!(
            sequencer.begin_cascade(&mut engine),
            Some(Directive::Emit(SceneSignal::AllGone { at: SceneTime::ZERO }))
        );
        assert!(engine.queue().is_empty());
        assert_eq!(sequencer.dropped().count(), 0);
    }

    #[test]
    fn test_dropped_actor_keeps_aggregate_open() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(
            Choreography::default().with_cascade(ids(&[1, 2]), Duration::from_millis(500)),
            &EngineConfig::default(),
        );
        sequencer.begin_cascade(&mut engine);
        sequencer.record_dropped(ActorId::new(2));

        let done = SceneSignal::DisappearComplete {
            actor: ActorId::new(1),
            at: SceneTime::from_millis(1000),
        };
        assert_eq!(sequencer.on_signal(&done, &mut engine), None);
        assert!(!sequencer.is_all_gone());
        assert_eq!(sequencer.awaiting().collect::<Vec<_>>(), ids(&[2]));
        assert_eq!(sequencer.dropped().collect::<Vec<_>>(), ids(&[2]));
    }

    #[test]
    fn test_empty_cascade_is_immediately_gone() {
        let mut engine = TimerEngine::new();
        let mut sequencer = Sequencer::new(Choreography::default(), &EngineConfig::default());
        assert_eq!(
            sequencer.begin_cascade(&mut engine),
            Some(Directive::Emit(SceneSignal::AllGone { at: SceneTime::ZERO }))
        );
    }

    #[test]
    fn test_validation() {
        let actors: HashSet<ActorId> = ids(&[1, 2, 3]).into_iter().collect();
        Choreography::chain(ids(&[1, 2, 3]), vec![Duration::from_secs(2); 2])
            .validate(&actors)
            .unwrap();

        let unknown = Choreography::chain(ids(&[1, 9]), vec![]);
        assert!(unknown.validate(&actors).is_err());

        let twice = Choreography::chain(ids(&[1, 1]), vec![]);
        assert!(twice.validate(&actors).is_err());

        let too_many = Choreography::chain(ids(&[1, 2]), vec![Duration::ZERO; 2]);
        assert!(too_many.validate(&actors).is_err());

        let orphan_lead_in = Choreography::default().with_lead_in(Duration::ZERO);
        assert!(orphan_lead_in.validate(&actors).is_err());
    }

    #[test]
    fn test_choreography_json() {
        let json = r#"{ "entrance": [1, 2], "delays_ms": [1500], "lead_in_ms": 0, "stagger_ms": 400 }"#;
        let choreography: Choreography = serde_json::from_str(json).unwrap();
        assert_eq!(choreography.delays, vec![Duration::from_millis(1500)]);
        assert_eq!(choreography.lead_in, Some(Duration::ZERO));
        assert_eq!(choreography.stagger, Some(Duration::from_millis(400)));
        assert!(choreography.cascade.is_empty());
    }
}
