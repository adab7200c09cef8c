//! Trigger fuzzer
//!
//! Drives a scene with random interleavings of trigger edges, cascade
//! requests, volume writes, media-end notices, time advances and the
//! occasional teardown, then checks every invariant on the result.

use std::time::Duration;

use marionette_core::{ActorId, MarionetteResult, TriggerKind};
use marionette_runtime::Scene;
use marionette_voice::PlaybackHandle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::invariants::{self, InvariantResult};
use crate::simulator::{SceneSimulator, SimulationResult};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Operations per run
    pub op_count: usize,
    /// Longest single advance
    pub max_advance: Duration,
    /// Probability that an operation is a teardown
    pub teardown_prob: f64,
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            op_count: 200,
            max_advance: Duration::from_millis(1500),
            teardown_prob: 0.0,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    pub fn light() -> Self {
        FuzzerConfig {
            op_count: 50,
            ..Self::default()
        }
    }

    pub fn heavy() -> Self {
        FuzzerConfig {
            op_count: 2000,
            max_advance: Duration::from_millis(3000),
            teardown_prob: 0.002,
            seed: 42,
        }
    }
}

/// One fuzzing operation
#[derive(Clone, Debug, PartialEq)]
pub enum FuzzOp {
    Trigger {
        actor: ActorId,
        kind: TriggerKind,
        level: bool,
    },
    Cascade(bool),
    Volume(f32),
    MediaEnded(u64),
    Advance(Duration),
    Teardown,
}

/// Apply `op` to a simulated scene
pub fn apply(sim: &mut SceneSimulator, op: &FuzzOp) {
    if let FuzzOp::Advance(dt) = op {
        sim.run_for(*dt);
        return;
    }

    let scene = sim.scene_mut();
    match op {
        FuzzOp::Trigger { actor, kind, level } => {
            let _ = scene.set_trigger(*actor, *kind, *level);
        }
        FuzzOp::Cascade(level) => {
            let _ = scene.trigger_cascade(*level);
        }
        FuzzOp::Volume(volume) => {
            let _ = scene.set_volume(*volume);
        }
        FuzzOp::MediaEnded(handle) => {
            scene.media_ended(PlaybackHandle(*handle));
        }
        FuzzOp::Teardown => scene.teardown(),
        FuzzOp::Advance(_) => {}
    }
    sim.observe();
}

/// Run `ops` against `scene` and collect the result
pub fn run_ops(scene: Scene, ops: &[FuzzOp]) -> SimulationResult {
    let mut sim = SceneSimulator::new(scene).with_step(Duration::from_millis(10));
    sim.mount();
    for op in ops {
        apply(&mut sim, op);
    }
    sim.finish()
}

/// Seeded random trigger fuzzer
pub struct TriggerFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl TriggerFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        TriggerFuzzer { config, rng }
    }

    /// Random operation sequence over `actors`
    pub fn generate(&mut self, actors: &[ActorId]) -> Vec<FuzzOp> {
        (0..self.config.op_count)
            .map(|_| self.next_op(actors))
            .collect()
    }

    fn next_op(&mut self, actors: &[ActorId]) -> FuzzOp {
        if self.rng.gen_bool(self.config.teardown_prob) {
            return FuzzOp::Teardown;
        }
        match self.rng.gen_range(0..10) {
            0..=4 if !actors.is_empty() => {
                let actor = actors[self.rng.gen_range(0..actors.len())];
                let kind = match self.rng.gen_range(0..3) {
                    0 => TriggerKind::Start,
                    1 => TriggerKind::ContinueTalking,
                    _ => TriggerKind::Disappear,
                };
                FuzzOp::Trigger {
                    actor,
                    kind,
                    level: self.rng.gen_bool(0.5),
                }
            }
            5 => FuzzOp::Cascade(self.rng.gen_bool(0.5)),
            6 => FuzzOp::Volume(self.rng.gen_range(-0.5..1.5)),
            7 => FuzzOp::MediaEnded(self.rng.gen_range(0..8)),
            _ => {
                let max = self.config.max_advance.as_millis() as u64;
                FuzzOp::Advance(Duration::from_millis(self.rng.gen_range(0..=max)))
            }
        }
    }

    /// Build a fresh scene, drive it with random operations and check it
    pub fn run(
        &mut self,
        build: impl FnOnce() -> MarionetteResult<Scene>,
    ) -> MarionetteResult<(SimulationResult, InvariantResult)> {
        let scene = build()?;
        let actors: Vec<ActorId> = scene.actors().iter().map(|a| a.id()).collect();
        let ops = self.generate(&actors);
        let result = run_ops(scene, &ops);
        let verdict = invariants::check_all(&result);
        Ok((result, verdict))
    }
}
