//! Scene
//!
//! A scene owns everything its actors share: the timer engine, the
//! sequencer, the audio session and playback service, the RNG behind blinks
//! and pauses, and the diagnostics buffer. It is driven from outside, either
//! by a test stepping virtual time or by the real-time runner.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::Duration;

use marionette_core::{
    ActorId, EdgeLatch, EngineEvent, MarionetteError, MarionetteResult, SceneId, SceneTime, Stage,
    TriggerKind,
};
use marionette_time::{CategoryCounts, FiredTimer, TimerEngine, TimerOwner};
use marionette_visual::{DriverTimer, ExpressionTable};
use marionette_voice::{AudioSession, NullPlayback, PlaybackHandle, PlaybackService};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::actor::{Actor, ActorContext, ActorView};
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::script::{ActorScript, ScriptPart};
use crate::sequencer::{Choreography, Directive, Sequencer, SequencerStep};

/// Timer payload of a scene
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneTimer {
    /// Frame driver tick or stop
    Driver(DriverTimer),
    /// Travel tween finished
    TravelEnd,
    /// Disappearance fade finished
    FadeEnd,
    /// Delayed sequencer step
    Step(SequencerStep),
}

impl From<DriverTimer> for SceneTimer {
    fn from(timer: DriverTimer) -> Self {
        SceneTimer::Driver(timer)
    }
}

/// Completion output of a scene
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneSignal {
    /// An actor finished its entrance or its continuation
    Completed {
        actor: ActorId,
        part: ScriptPart,
        at: SceneTime,
    },
    /// An actor's disappearance finished
    DisappearComplete { actor: ActorId, at: SceneTime },
    /// Every actor of the cascade reported its disappearance
    AllGone { at: SceneTime },
}

impl SceneSignal {
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            SceneSignal::Completed { actor, .. } | SceneSignal::DisappearComplete { actor, .. } => {
                Some(*actor)
            }
            SceneSignal::AllGone { .. } => None,
        }
    }

    pub fn at(&self) -> SceneTime {
        match self {
            SceneSignal::Completed { at, .. }
            | SceneSignal::DisappearComplete { at, .. }
            | SceneSignal::AllGone { at } => *at,
        }
    }
}

/// Render state of a whole scene at one instant
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub scene: SceneId,
    pub at_ms: u64,
    pub actors: Vec<ActorView>,
    pub volume: f32,
    pub torn_down: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SceneStats {
    pub advances: u64,
    pub timers_fired: u64,
    pub signals_emitted: u64,
    /// Timer dispatches that returned an error
    pub dispatch_errors: u64,
}

struct ActorSpec {
    id: ActorId,
    name: String,
    script: ActorScript,
    expressions: ExpressionTable,
}

/// Builder for [`Scene`]
pub struct SceneBuilder {
    id: SceneId,
    config: EngineConfig,
    actors: Vec<ActorSpec>,
    choreography: Choreography,
    playback: Box<dyn PlaybackService>,
    volume: f32,
}

impl SceneBuilder {
    pub fn new(id: SceneId) -> Self {
        SceneBuilder {
            id,
            config: EngineConfig::default(),
            actors: Vec::new(),
            choreography: Choreography::default(),
            playback: Box::new(NullPlayback::new()),
            volume: 1.0,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn actor(
        mut self,
        id: ActorId,
        name: impl Into<String>,
        script: ActorScript,
        expressions: ExpressionTable,
    ) -> Self {
        self.actors.push(ActorSpec {
            id,
            name: name.into(),
            script,
            expressions,
        });
        self
    }

    pub fn choreography(mut self, choreography: Choreography) -> Self {
        self.choreography = choreography;
        self
    }

    pub fn playback(mut self, playback: impl PlaybackService + 'static) -> Self {
        self.playback = Box::new(playback);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn build(self) -> MarionetteResult<Scene> {
        self.config.validate()?;
        let mut actors = Vec::with_capacity(self.actors.len());
        let mut index = HashMap::new();
        for entry in self.actors {
            if index.insert(entry.id, actors.len()).is_some() {
                return Err(MarionetteError::DuplicateActor(entry.id));
            }
            actors.push(Actor::new(
                entry.id,
                entry.name,
                entry.script,
                entry.expressions,
                &self.config,
            )?);
        }

        let known: HashSet<ActorId> = index.keys().copied().collect();
        self.choreography.validate(&known)?;

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Scene {
            id: self.id,
            engine: TimerEngine::new(),
            actors,
            index,
            sequencer: Sequencer::new(self.choreography, &self.config),
            audio: AudioSession::with_volume(self.id, self.volume),
            playback: self.playback,
            rng,
            diagnostics: Diagnostics::new(self.config.diagnostics_capacity),
            outbox: VecDeque::new(),
            cascade: EdgeLatch::new(),
            stats: SceneStats::default(),
            config: self.config,
            mounted: false,
            torn_down: false,
        })
    }
}

/// One running scene
pub struct Scene {
    id: SceneId,
    config: EngineConfig,
    engine: TimerEngine<SceneTimer>,
    actors: Vec<Actor>,
    index: HashMap<ActorId, usize>,
    sequencer: Sequencer,
    audio: AudioSession,
    playback: Box<dyn PlaybackService>,
    rng: StdRng,
    diagnostics: Diagnostics,
    /// Signals not yet drained by the host
    outbox: VecDeque<SceneSignal>,
    /// Cascade trigger input
    cascade: EdgeLatch,
    stats: SceneStats,
    mounted: bool,
    torn_down: bool,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("now", &self.engine.now())
            .field("actors", &self.actors.len())
            .field("pending_timers", &self.engine.queue().len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl Scene {
    pub fn builder(id: SceneId) -> SceneBuilder {
        SceneBuilder::new(id)
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Current scene time
    pub fn now(&self) -> SceneTime {
        self.engine.now()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.index.get(&id).map(|&i| &self.actors[i])
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Stage of an actor, `None` for unknown ids
    pub fn stage(&self, id: ActorId) -> Option<Stage> {
        self.actor(id).map(Actor::stage)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn stats(&self) -> &SceneStats {
        &self.stats
    }

    pub fn audio(&self) -> &AudioSession {
        &self.audio
    }

    pub fn engine(&self) -> &TimerEngine<SceneTimer> {
        &self.engine
    }

    /// Pending timers of one actor, per category
    pub fn census(&self, actor: ActorId) -> CategoryCounts {
        self.engine.census(TimerOwner::Actor(actor))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn ensure_live(&self) -> MarionetteResult<()> {
        if self.torn_down {
            Err(MarionetteError::SceneTornDown)
        } else {
            Ok(())
        }
    }

    /// Mount the scene and start the choreography's lead-in. Idempotent.
    pub fn mount(&mut self) -> MarionetteResult<()> {
        self.ensure_live()?;
        if self.mounted {
            return Ok(());
        }
        self.mounted = true;
        info!(scene = %self.id, actors = self.actors.len(), "scene mounted");

        if let Some(directive) = self.sequencer.mount(&mut self.engine) {
            self.apply(directive);
        }
        Ok(())
    }

    /// Feed a trigger level to an actor. Returns true if a rising edge was acted on.
    pub fn set_trigger(
        &mut self,
        actor: ActorId,
        kind: TriggerKind,
        level: bool,
    ) -> MarionetteResult<bool> {
        self.ensure_live()?;
        self.with_actor(actor, |a, ctx| a.trigger(kind, level, ctx))
    }

    pub fn start(&mut self, actor: ActorId, level: bool) -> MarionetteResult<bool> {
        self.set_trigger(actor, TriggerKind::Start, level)
    }

    pub fn continue_talking(&mut self, actor: ActorId, level: bool) -> MarionetteResult<bool> {
        self.set_trigger(actor, TriggerKind::ContinueTalking, level)
    }

    pub fn disappear(&mut self, actor: ActorId, level: bool) -> MarionetteResult<bool> {
        self.set_trigger(actor, TriggerKind::Disappear, level)
    }

    /// Feed the cascade trigger level. The cascade runs at most once.
    pub fn trigger_cascade(&mut self, level: bool) -> MarionetteResult<bool> {
        self.ensure_live()?;
        if !self.cascade.feed(level) {
            return Ok(false);
        }
        match self.sequencer.begin_cascade(&mut self.engine) {
            Some(directive) => {
                self.apply(directive);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Set the shared volume; last writer wins. Returns the level applied.
    pub fn set_volume(&mut self, volume: f32) -> MarionetteResult<f32> {
        let level = self.audio.set_volume(volume)?;
        if let Some(gain) = self.audio.current_gain() {
            self.playback.apply_gain(&gain);
        }
        Ok(level)
    }

    /// Advisory end-of-media notice from the playback service
    pub fn media_ended(&mut self, handle: PlaybackHandle) -> bool {
        if self.torn_down {
            return false;
        }
        let actor = self
            .actors
            .iter_mut()
            .find_map(|a| a.media_ended(handle).then(|| a.id()));
        self.diagnostics.record(EngineEvent::MediaEnded {
            actor,
            handle: handle.0,
            at: self.engine.now(),
        });
        actor.is_some()
    }

    /// Advance scene time by `dt`, firing due timers. Returns how many fired.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let deadline = self.now() + dt;
        self.run_until(deadline)
    }

    /// Fire every timer due at or before `deadline`, in order
    pub fn run_until(&mut self, deadline: SceneTime) -> usize {
        if self.torn_down {
            return 0;
        }
        self.stats.advances += 1;

        let mut fired = 0;
        while let Some(timer) = self.engine.pop_until(deadline) {
            fired += 1;
            self.dispatch(timer);
        }
        self.stats.timers_fired += fired as u64;
        fired
    }

    /// Signals emitted so far and not yet drained
    pub fn signals(&self) -> impl Iterator<Item = &SceneSignal> {
        self.outbox.iter()
    }

    pub fn drain_signals(&mut self) -> Vec<SceneSignal> {
        self.outbox.drain(..).collect()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let now = self.now();
        SceneSnapshot {
            scene: self.id,
            at_ms: now.as_millis(),
            actors: self.actors.iter().map(|a| a.view(now)).collect(),
            volume: self.audio.volume(),
            torn_down: self.torn_down,
        }
    }

    /// Cancel every actor, drop pending sequencer steps and dispose the
    /// audio session. Nothing fires afterwards. Idempotent; also run on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }

        let ids: Vec<ActorId> = self.actors.iter().map(Actor::id).collect();
        let mut timers = 0;
        let mut audio = 0;
        for id in ids {
            if let Ok(report) = self.with_actor(id, |a, ctx| Ok(a.cancel(ctx))) {
                timers += report.timers.total();
                audio += report.audio_released;
            }
        }
        timers += self.engine.cancel_owner(TimerOwner::Sequencer).total();
        self.audio.dispose();
        self.torn_down = true;

        info!(
            scene = %self.id,
            at_ms = self.now().as_millis(),
            timers_cleared = timers,
            audio_released = audio,
            "scene torn down"
        );
    }

    fn dispatch(&mut self, fired: FiredTimer<SceneTimer>) {
        let result = match (fired.owner, fired.payload) {
            (TimerOwner::Sequencer, SceneTimer::Step(step)) => self.run_step(step),
            (TimerOwner::Actor(actor), payload) => {
                self.with_actor(actor, |a, ctx| a.on_timer(payload, ctx))
            }
            (owner, payload) => {
                warn!(owner = ?owner, payload = ?payload, "timer without a handler");
                Ok(())
            }
        };

        if let Err(err) = result {
            self.stats.dispatch_errors += 1;
            error!(scene = %self.id, error = %err, "timer dispatch failed");
        }
    }

    fn run_step(&mut self, step: SequencerStep) -> MarionetteResult<()> {
        debug!(scene = %self.id, step = ?step, at_ms = self.now().as_millis(), "sequencer step");
        match step {
            SequencerStep::Start(actor) => {
                self.with_actor(actor, |a, ctx| a.pulse(TriggerKind::Start, ctx))?;
            }
            SequencerStep::Disappear(actor) => {
                let accepted =
                    self.with_actor(actor, |a, ctx| a.pulse(TriggerKind::Disappear, ctx))?;
                let stage = self.stage(actor).unwrap_or_default();
                if !accepted && matches!(stage, Stage::Disappearing | Stage::Done) {
                    // Already leaving on its own; its report settles the cascade
                    debug!(scene = %self.id, actor = %actor, stage = %stage, "cascade reached a departing actor");
                } else if !accepted {
                    self.sequencer.record_dropped(actor);
                    self.diagnostics.record(EngineEvent::CascadeDropped {
                        actor,
                        stage,
                        at: self.engine.now(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Dispatch(step) => {
                if let Err(err) = self.run_step(step) {
                    self.stats.dispatch_errors += 1;
                    error!(scene = %self.id, error = %err, "sequencer step failed");
                }
            }
            Directive::Emit(signal) => self.emit(signal),
        }
    }

    /// Pass an actor signal to the sequencer, then to the host
    fn route(&mut self, signal: SceneSignal) {
        let follow_up = self.sequencer.on_signal(&signal, &mut self.engine);
        self.emit(signal);
        if let Some(directive) = follow_up {
            self.apply(directive);
        }
    }

    fn emit(&mut self, signal: SceneSignal) {
        debug!(scene = %self.id, signal = ?signal, "signal");
        self.stats.signals_emitted += 1;
        self.outbox.push_back(signal);
    }

    /// Run `f` against one actor with the scene's shared state lent out
    fn with_actor<R>(
        &mut self,
        id: ActorId,
        f: impl FnOnce(&mut Actor, &mut ActorContext<'_>) -> MarionetteResult<R>,
    ) -> MarionetteResult<R> {
        let index = *self
            .index
            .get(&id)
            .ok_or(MarionetteError::UnknownActor(id))?;

        let mut emitted = Vec::new();
        let result = {
            let mut ctx = ActorContext {
                engine: &mut self.engine,
                playback: &mut *self.playback,
                audio: &mut self.audio,
                rng: &mut self.rng,
                diagnostics: &mut self.diagnostics,
                signals: &mut emitted,
                config: &self.config,
            };
            f(&mut self.actors[index], &mut ctx)
        };

        for signal in emitted {
            self.route(signal);
        }
        result
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.teardown();
    }
}
