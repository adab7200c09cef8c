//! Deterministic scene simulator
//!
//! Steps a scene on virtual time in small increments and samples it after
//! every step: per-category timer census of each actor, frame membership,
//! and the signals it emitted.

use std::collections::HashMap;
use std::time::Duration;

use marionette_core::{ActorId, EngineEvent, MarionetteResult, SceneTime, Stage, TriggerKind};
use marionette_runtime::{Scene, SceneSignal};
use marionette_time::TimerCategory;

use crate::invariants::{self, InvariantViolation};

const DEFAULT_STEP: Duration = Duration::from_millis(5);

/// Everything observed during a simulated run
#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub ended_at: SceneTime,
    pub signals: Vec<SceneSignal>,
    pub events: Vec<EngineEvent>,
    /// Largest census seen per (actor, category), with when it was seen
    pub census_max: HashMap<(ActorId, TimerCategory), (usize, SceneTime)>,
    /// Resolved cascade order of the scene
    pub cascade: Vec<ActorId>,
    pub final_stages: Vec<(ActorId, Stage)>,
    /// Violations caught while sampling
    pub violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    pub fn stage_of(&self, actor: ActorId) -> Option<Stage> {
        self.final_stages
            .iter()
            .find(|(id, _)| *id == actor)
            .map(|(_, stage)| *stage)
    }

    /// When `actor` entered `stage`, first time only
    pub fn entered_at(&self, actor: ActorId, stage: Stage) -> Option<SceneTime> {
        self.events.iter().find_map(|e| match e {
            EngineEvent::StageChanged { actor: a, to, at, .. } if *a == actor && *to == stage => {
                Some(*at)
            }
            _ => None,
        })
    }

    pub fn count_events(&self, predicate: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    pub fn all_gone_at(&self) -> Option<SceneTime> {
        self.signals.iter().find_map(|s| match s {
            SceneSignal::AllGone { at } => Some(*at),
            _ => None,
        })
    }
}

/// Scene simulator
pub struct SceneSimulator {
    scene: Scene,
    step: Duration,
    census_max: HashMap<(ActorId, TimerCategory), (usize, SceneTime)>,
    signals: Vec<SceneSignal>,
    violations: Vec<InvariantViolation>,
}

impl SceneSimulator {
    pub fn new(scene: Scene) -> Self {
        let mut simulator = SceneSimulator {
            scene,
            step: DEFAULT_STEP,
            census_max: HashMap::new(),
            signals: Vec::new(),
            violations: Vec::new(),
        };
        simulator.observe();
        simulator
    }

    /// Sampling step; smaller steps catch shorter-lived states
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step.max(Duration::from_micros(1));
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct access; call [`SceneSimulator::observe`] after driving the
    /// scene by hand
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn now(&self) -> SceneTime {
        self.scene.now()
    }

    pub fn signals(&self) -> &[SceneSignal] {
        &self.signals
    }

    pub fn mount(&mut self) {
        if self.scene.mount().is_ok() {
            self.observe();
        }
    }

    /// Present a fresh rising edge on a trigger. Returns true if acted on.
    pub fn pulse(&mut self, actor: ActorId, kind: TriggerKind) -> MarionetteResult<bool> {
        self.scene.set_trigger(actor, kind, false)?;
        let acted = self.scene.set_trigger(actor, kind, true)?;
        self.observe();
        Ok(acted)
    }

    /// Fire the cascade trigger
    pub fn cascade(&mut self) -> MarionetteResult<bool> {
        self.scene.trigger_cascade(false)?;
        let acted = self.scene.trigger_cascade(true)?;
        self.observe();
        Ok(acted)
    }

    /// Advance one sampling step
    pub fn step(&mut self) -> usize {
        let fired = self.scene.advance(self.step);
        self.observe();
        fired
    }

    /// Advance `duration` in sampling steps
    pub fn run_for(&mut self, duration: Duration) {
        let end = self.now() + duration;
        while self.now() < end && !self.scene.is_torn_down() {
            let dt = self.step.min(end - self.now());
            self.scene.advance(dt);
            self.observe();
        }
    }

    /// Advance until `done` holds or `limit` passes. Returns whether `done` held.
    pub fn run_until(&mut self, limit: Duration, mut done: impl FnMut(&Scene) -> bool) -> bool {
        let end = self.now() + limit;
        while self.now() < end && !self.scene.is_torn_down() {
            if done(&self.scene) {
                return true;
            }
            let dt = self.step.min(end - self.now());
            self.scene.advance(dt);
            self.observe();
        }
        done(&self.scene)
    }

    pub fn teardown(&mut self) {
        self.scene.teardown();
        self.observe();
    }

    /// Sample the scene
    pub fn observe(&mut self) {
        let now = self.scene.now();
        for actor in self.scene.actors() {
            for (category, count) in self.scene.census(actor.id()).iter() {
                let slot = self
                    .census_max
                    .entry((actor.id(), category))
                    .or_insert((0, now));
                if count > slot.0 {
                    *slot = (count, now);
                }
            }
            if let Err(violation) = invariants::frame_in_set(actor) {
                self.violations.push(violation);
            }
        }
        self.signals.extend(self.scene.drain_signals());
    }

    pub fn finish(mut self) -> SimulationResult {
        self.observe();
        let scene = &self.scene;
        SimulationResult {
            ended_at: scene.now(),
            signals: std::mem::take(&mut self.signals),
            events: scene.diagnostics().events().cloned().collect(),
            census_max: std::mem::take(&mut self.census_max),
            cascade: scene.sequencer().cascade().to_vec(),
            final_stages: scene.actors().iter().map(|a| (a.id(), a.stage())).collect(),
            violations: std::mem::take(&mut self.violations),
        }
    }
}
