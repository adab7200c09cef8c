//! Actor state machine
//!
//! One actor walks its script phase by phase. Every stage change goes through
//! [`Actor::transition`], which runs the cleanup gate before anything of the
//! next phase is scheduled. Inputs are edge-triggered: only a false -> true
//! change of a trigger level does anything, and a rising edge in an
//! ineligible stage is ignored and reported, never queued.

use marionette_core::{
    ActorId, ActorPose, DriverKind, EdgeLatch, EngineEvent, MarionetteError, MarionetteResult,
    SceneTime, Stage, TriggerKind,
};
use marionette_time::{TimerCategory, TimerEngine, TimerOwner};
use marionette_visual::{
    DriverTimer, ExpressionSet, ExpressionTable, Fade, FrameRef, Motion, Point, TalkingDriver,
    WalkingDriver,
};
use marionette_voice::{
    AudioSession, CueCursor, PlaybackError, PlaybackHandle, PlaybackService,
};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::cleanup::{CleanupGate, CleanupReport};
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::scene::{SceneSignal, SceneTimer};
use crate::script::{ActorScript, Phase, ScriptPart};

/// Everything an actor touches outside itself, borrowed from the scene for
/// the duration of one call
pub struct ActorContext<'a> {
    pub engine: &'a mut TimerEngine<SceneTimer>,
    pub playback: &'a mut dyn PlaybackService,
    pub audio: &'a mut AudioSession,
    pub rng: &'a mut StdRng,
    pub diagnostics: &'a mut Diagnostics,
    pub signals: &'a mut Vec<SceneSignal>,
    pub config: &'a EngineConfig,
}

impl ActorContext<'_> {
    #[inline]
    pub fn now(&self) -> SceneTime {
        self.engine.now()
    }
}

/// What the renderer needs to draw one actor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActorView {
    pub id: ActorId,
    pub name: String,
    pub stage: Stage,
    /// `None` while the actor renders nothing
    pub frame: Option<FrameRef>,
    pub position: Point,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Triggers {
    start: EdgeLatch,
    continue_talking: EdgeLatch,
    disappear: EdgeLatch,
}

impl Triggers {
    fn latch(&mut self, kind: TriggerKind) -> &mut EdgeLatch {
        match kind {
            TriggerKind::Start => &mut self.start,
            TriggerKind::ContinueTalking => &mut self.continue_talking,
            TriggerKind::Disappear => &mut self.disappear,
        }
    }
}

/// One on-screen character
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    name: String,
    script: ActorScript,
    expressions: ExpressionTable,
    stage: Stage,
    /// Phase list being played and index into it
    part: ScriptPart,
    phase: usize,
    /// Expression set the current frame comes from
    set: String,
    pose: ActorPose,
    cursor: Option<CueCursor>,
    talking: TalkingDriver,
    walking: WalkingDriver,
    position: Point,
    motion: Option<Motion>,
    fade: Option<Fade>,
    /// Playback handles not yet stopped or reported ended
    in_flight: Vec<PlaybackHandle>,
    triggers: Triggers,
    cancelled: bool,
}

impl Actor {
    /// Create an actor in `Initial`. Fails if the script does not fit the
    /// stage machine or the expression table.
    pub fn new(
        id: ActorId,
        name: impl Into<String>,
        script: ActorScript,
        expressions: ExpressionTable,
        config: &EngineConfig,
    ) -> MarionetteResult<Self> {
        script.validate(id, &expressions)?;

        let owner = TimerOwner::Actor(id);
        let set = script
            .entrance
            .first()
            .map(|phase| phase.set().to_string())
            .ok_or_else(|| MarionetteError::InvalidScript {
                actor: id,
                reason: "entrance has no phases".to_string(),
            })?;
        let pose = expressions
            .get(&set)
            .map(ExpressionSet::idle_pose)
            .unwrap_or_default();

        Ok(Actor {
            id,
            name: name.into(),
            position: script.origin,
            script,
            expressions,
            stage: Stage::Initial,
            part: ScriptPart::Entrance,
            phase: 0,
            set,
            pose,
            cursor: None,
            talking: TalkingDriver::new(owner, config.talking.clone(), config.measured.clone()),
            walking: WalkingDriver::new(owner, config.walking.clone()),
            motion: None,
            fade: None,
            in_flight: Vec::new(),
            triggers: Triggers::default(),
            cancelled: false,
        })
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> TimerOwner {
        TimerOwner::Actor(self.id)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn part(&self) -> ScriptPart {
        self.part
    }

    pub fn script(&self) -> &ActorScript {
        &self.script
    }

    pub fn expressions(&self) -> &ExpressionTable {
        &self.expressions
    }

    /// Name of the expression set in use
    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn pose(&self) -> ActorPose {
        self.pose
    }

    pub fn talking(&self) -> &TalkingDriver {
        &self.talking
    }

    pub fn walking(&self) -> &WalkingDriver {
        &self.walking
    }

    pub fn in_flight(&self) -> &[PlaybackHandle] {
        &self.in_flight
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Current frame, derived from the set and the pose axes.
    /// `None` before the actor appears, once it is gone, or after cancel.
    pub fn frame(&self) -> Option<&FrameRef> {
        if self.cancelled || self.stage.is_invisible() {
            return None;
        }
        self.expressions.resolve(&self.set, self.pose).ok()
    }

    pub fn position_at(&self, now: SceneTime) -> Point {
        match &self.motion {
            Some(motion) => motion.position_at(now),
            None => self.position,
        }
    }

    pub fn opacity_at(&self, now: SceneTime) -> f32 {
        match (self.stage, &self.fade) {
            (stage, _) if stage.is_invisible() => 0.0,
            (_, Some(fade)) => fade.opacity_at(now),
            _ => 1.0,
        }
    }

    pub fn view(&self, now: SceneTime) -> ActorView {
        ActorView {
            id: self.id,
            name: self.name.clone(),
            stage: self.stage,
            frame: self.frame().cloned(),
            position: self.position_at(now),
            opacity: if self.cancelled { 0.0 } else { self.opacity_at(now) },
        }
    }

    /// Last level seen on a trigger input
    pub fn trigger_level(&self, kind: TriggerKind) -> bool {
        match kind {
            TriggerKind::Start => self.triggers.start.level(),
            TriggerKind::ContinueTalking => self.triggers.continue_talking.level(),
            TriggerKind::Disappear => self.triggers.disappear.level(),
        }
    }

    /// Feed a trigger level. Returns true if a rising edge was acted on.
    pub fn trigger(
        &mut self,
        kind: TriggerKind,
        level: bool,
        ctx: &mut ActorContext<'_>,
    ) -> MarionetteResult<bool> {
        if !self.triggers.latch(kind).feed(level) {
            return Ok(false);
        }
        self.fire(kind, ctx)
    }

    /// A rising edge whatever level the input had before; used by sequencer steps
    pub fn pulse(&mut self, kind: TriggerKind, ctx: &mut ActorContext<'_>) -> MarionetteResult<bool> {
        let latch = self.triggers.latch(kind);
        latch.feed(false);
        latch.feed(true);
        self.fire(kind, ctx)
    }

    pub fn start(&mut self, level: bool, ctx: &mut ActorContext<'_>) -> MarionetteResult<bool> {
        self.trigger(TriggerKind::Start, level, ctx)
    }

    pub fn continue_talking(
        &mut self,
        level: bool,
        ctx: &mut ActorContext<'_>,
    ) -> MarionetteResult<bool> {
        self.trigger(TriggerKind::ContinueTalking, level, ctx)
    }

    pub fn disappear(&mut self, level: bool, ctx: &mut ActorContext<'_>) -> MarionetteResult<bool> {
        self.trigger(TriggerKind::Disappear, level, ctx)
    }

    /// Is a rising edge of `kind` acted on in the current stage?
    pub fn accepts(&self, kind: TriggerKind) -> bool {
        if self.cancelled {
            return false;
        }
        match kind {
            TriggerKind::Start => self.stage == Stage::Initial,
            TriggerKind::ContinueTalking => {
                self.stage.accepts_continuation() && !self.script.continuation.is_empty()
            }
            TriggerKind::Disappear => self.stage.is_settled(),
        }
    }

    fn fire(&mut self, kind: TriggerKind, ctx: &mut ActorContext<'_>) -> MarionetteResult<bool> {
        if !self.accepts(kind) {
            ctx.diagnostics.record(EngineEvent::TriggerIgnored {
                actor: self.id,
                trigger: kind,
                stage: self.stage,
                at: ctx.now(),
            });
            return Ok(false);
        }

        match kind {
            TriggerKind::Start => self.enter_phase(ScriptPart::Entrance, 0, ctx)?,
            TriggerKind::ContinueTalking => self.enter_phase(ScriptPart::Continuation, 0, ctx)?,
            TriggerKind::Disappear => self.begin_disappearing(ctx)?,
        }
        Ok(true)
    }

    /// Handle one of this actor's timers
    pub fn on_timer(&mut self, timer: SceneTimer, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        if self.cancelled {
            return Ok(());
        }

        match timer {
            SceneTimer::Driver(DriverTimer::MouthTick) => {
                let now = ctx.now();
                self.pose = ActorPose::Face(self.talking.on_mouth_tick(now, ctx.rng));
            }
            SceneTimer::Driver(DriverTimer::EyeTick) => {
                self.pose = ActorPose::Face(self.talking.on_eye_tick(ctx.rng));
            }
            SceneTimer::Driver(DriverTimer::TalkStop) => {
                self.pose = ActorPose::Face(self.talking.finish(ctx.engine));
                self.next_cue(ctx)?;
            }
            SceneTimer::Driver(DriverTimer::LegTick) => {
                self.pose = ActorPose::Gait(self.walking.on_leg_tick(ctx.rng));
            }
            SceneTimer::TravelEnd => {
                self.pose = ActorPose::Gait(self.walking.stop(ctx.engine));
                if let Some(motion) = self.motion.take() {
                    self.position = motion.to;
                }
                self.next_phase(ctx)?;
            }
            SceneTimer::FadeEnd => self.finish_disappearing(ctx)?,
            SceneTimer::Step(_) => {}
        }
        Ok(())
    }

    /// Advisory end-of-media notice. Timing never depends on it.
    pub fn media_ended(&mut self, handle: PlaybackHandle) -> bool {
        let before = self.in_flight.len();
        self.in_flight.retain(|h| *h != handle);
        before != self.in_flight.len()
    }

    /// Cancel everything this actor has running. The actor renders nothing
    /// afterwards and ignores further triggers and timers.
    pub fn cancel(&mut self, ctx: &mut ActorContext<'_>) -> CleanupReport {
        let report = self.cleanup(ctx);
        self.fade = None;
        self.cancelled = true;
        debug!(actor = %self.id, stage = %self.stage, "actor cancelled");
        report
    }

    /// Run the cleanup gate and forget every driver handle
    fn cleanup(&mut self, ctx: &mut ActorContext<'_>) -> CleanupReport {
        let now = ctx.now();
        let report = CleanupGate::run(ctx.engine, self.owner(), &mut *ctx.playback, &mut self.in_flight);
        self.talking.detach();
        self.walking.detach();
        self.cursor = None;
        if let Some(motion) = self.motion.take() {
            self.position = motion.position_at(now);
        }

        ctx.diagnostics.record(EngineEvent::CleanupRan {
            actor: self.id,
            at: now,
            timers_cleared: report.timers.total(),
            audio_released: report.audio_released,
        });
        report
    }

    /// Move to `to`, cleanup first
    fn transition(&mut self, to: Stage, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        let from = self.stage;
        if !Stage::permits(from, to) {
            return Err(MarionetteError::InvalidTransition {
                actor: self.id,
                from,
                to,
            });
        }

        self.cleanup(ctx);
        let pending_after_cleanup = ctx.engine.pending_for(self.owner());
        self.stage = to;

        ctx.diagnostics.record(EngineEvent::StageChanged {
            actor: self.id,
            from,
            to,
            at: ctx.now(),
            pending_after_cleanup,
        });
        Ok(())
    }

    fn enter_phase(
        &mut self,
        part: ScriptPart,
        index: usize,
        ctx: &mut ActorContext<'_>,
    ) -> MarionetteResult<()> {
        let Some(phase) = self.script.phases(part).get(index).cloned() else {
            return Ok(());
        };

        self.transition(phase.stage(), ctx)?;
        self.part = part;
        self.phase = index;
        self.set = phase.set().to_string();

        match phase {
            Phase::Speak { cues, .. } => {
                self.talking.reset_pose();
                self.cursor = Some(CueCursor::new(cues));
                self.play_cue(ctx);
            }
            Phase::Travel { to, duration, .. } => {
                let now = ctx.now();
                self.motion = Some(Motion::new(self.position, to, now, duration));
                self.walking.start(ctx.engine);
                self.pose = ActorPose::Gait(self.walking.pose());
                ctx.engine.after(
                    self.owner(),
                    TimerCategory::Animation,
                    duration,
                    SceneTimer::TravelEnd,
                );
                ctx.diagnostics.record(EngineEvent::DriverStarted {
                    actor: self.id,
                    driver: DriverKind::Walking,
                    at: now,
                });
            }
            Phase::Settle { .. } => {
                self.pose = self.idle_pose();
                info!(actor = %self.id, part = ?part, stage = %self.stage, "actor settled");
                ctx.signals.push(SceneSignal::Completed {
                    actor: self.id,
                    part,
                    at: ctx.now(),
                });
            }
        }
        Ok(())
    }

    fn next_phase(&mut self, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        self.enter_phase(self.part, self.phase + 1, ctx)
    }

    fn next_cue(&mut self, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        let more = self
            .cursor
            .as_mut()
            .and_then(|cursor| cursor.advance())
            .is_some();
        if more {
            self.play_cue(ctx);
            Ok(())
        } else {
            self.cursor = None;
            self.next_phase(ctx)
        }
    }

    /// Start the cursor's current cue: audio best effort, animation on the
    /// declared duration
    fn play_cue(&mut self, ctx: &mut ActorContext<'_>) {
        let Some(cursor) = self.cursor.as_ref() else {
            return;
        };
        let Some(cue) = cursor.current().cloned() else {
            return;
        };
        let is_last = cursor.is_last();
        let now = ctx.now();

        for handle in self.in_flight.drain(..) {
            ctx.playback.stop(handle);
        }
        let played = ctx
            .audio
            .gain_stage()
            .map_err(PlaybackError::from)
            .and_then(|gain| ctx.playback.play(&cue, &gain));
        match played {
            Ok(handle) => self.in_flight.push(handle),
            Err(err) => ctx.diagnostics.record(EngineEvent::PlaybackFailed {
                actor: self.id,
                cue: cue.reference.clone(),
                reason: err.to_string(),
                at: now,
            }),
        }

        let cadence = ctx.config.cues.cadence(&cue);
        let stop_after = ctx.config.cues.stop_after(&cue, is_last);
        self.talking.start(ctx.engine, cadence, stop_after);
        self.pose = ActorPose::Face(self.talking.pose());
        ctx.diagnostics.record(EngineEvent::DriverStarted {
            actor: self.id,
            driver: cadence.driver_kind(),
            at: now,
        });
        debug!(
            actor = %self.id,
            cue = %cue.reference,
            stop_after_ms = stop_after.as_millis() as u64,
            "cue started"
        );
    }

    fn begin_disappearing(&mut self, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        self.transition(Stage::Disappearing, ctx)?;

        let now = ctx.now();
        let duration = self
            .script
            .disappear
            .duration
            .unwrap_or(ctx.config.disappear_fade);
        self.set = self.script.disappear.set.clone();
        self.pose = self.idle_pose();
        self.fade = Some(Fade::new(now, duration));
        ctx.engine.after(
            self.owner(),
            TimerCategory::Animation,
            duration,
            SceneTimer::FadeEnd,
        );
        Ok(())
    }

    fn finish_disappearing(&mut self, ctx: &mut ActorContext<'_>) -> MarionetteResult<()> {
        self.transition(Stage::Done, ctx)?;
        self.fade = None;
        info!(actor = %self.id, "actor gone");
        ctx.signals.push(SceneSignal::DisappearComplete {
            actor: self.id,
            at: ctx.now(),
        });
        Ok(())
    }

    fn idle_pose(&self) -> ActorPose {
        self.expressions
            .get(&self.set)
            .map(ExpressionSet::idle_pose)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{AudioCue, GaitPose, SceneId};
    use marionette_visual::names;
    use marionette_voice::ScriptedPlayback;
    use rand::SeedableRng;
    use std::time::Duration;

    struct Rig {
        engine: TimerEngine<SceneTimer>,
        playback: ScriptedPlayback,
        audio: AudioSession,
        rng: StdRng,
        diagnostics: Diagnostics,
        signals: Vec<SceneSignal>,
        config: EngineConfig,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                engine: TimerEngine::new(),
                playback: ScriptedPlayback::new(),
                audio: AudioSession::new(SceneId::new(1)),
                rng: StdRng::seed_from_u64(3),
                diagnostics: Diagnostics::new(1024),
                signals: Vec::new(),
                config: EngineConfig::default(),
            }
        }

        fn ctx(&mut self) -> ActorContext<'_> {
            ActorContext {
                engine: &mut self.engine,
                playback: &mut self.playback,
                audio: &mut self.audio,
                rng: &mut self.rng,
                diagnostics: &mut self.diagnostics,
                signals: &mut self.signals,
                config: &self.config,
            }
        }

        fn run_until(&mut self, actor: &mut Actor, ms: u64) {
            let deadline = SceneTime::from_millis(ms);
            while let Some(fired) = self.engine.pop_until(deadline) {
                actor.on_timer(fired.payload, &mut self.ctx()).unwrap();
            }
        }
    }

    fn greeter(config: &EngineConfig) -> Actor {
        let script = ActorScript::builder()
            .speak(Stage::Hola, names::HOLA, vec![AudioCue::from_millis("a.mp3", 1000)])
            .travel(Stage::Walking, names::WALKING, Point::new(5.0, 0.0), Duration::from_millis(2000))
            .settle(Stage::Static, names::STATIC)
            .continuation()
            .speak(
                Stage::ArmUpTalking,
                names::ARM_UP_TALKING,
                vec![AudioCue::from_millis("b.mp3", 600)],
            )
            .settle(Stage::FinalStatic, names::STATIC)
            .build();
        Actor::new(
            ActorId::new(1),
            "alex",
            script,
            ExpressionTable::conventional("alex"),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_invisible_until_started() {
        let rig = Rig::new();
        let actor = greeter(&rig.config);
        assert_eq!(actor.stage(), Stage::Initial);
        assert!(actor.frame().is_none());
        assert_eq!(actor.opacity_at(SceneTime::ZERO), 0.0);
    }

    #[test]
    fn test_start_is_edge_triggered() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);

        assert!(!actor.start(false, &mut rig.ctx()).unwrap());
        assert!(actor.start(true, &mut rig.ctx()).unwrap());
        assert_eq!(actor.stage(), Stage::Hola);
        // steady level: nothing happens
        assert!(!actor.start(true, &mut rig.ctx()).unwrap());
        // new edge in an ineligible stage: ignored and reported
        actor.start(false, &mut rig.ctx()).unwrap();
        assert!(!actor.start(true, &mut rig.ctx()).unwrap());
        assert_eq!(
            rig.diagnostics
                .count(|e| matches!(e, EngineEvent::TriggerIgnored { trigger: TriggerKind::Start, .. })),
            1
        );
        assert_eq!(rig.engine.pending_in(actor.owner(), TimerCategory::Mouth), 1);
    }

    #[test]
    fn test_hola_hands_off_to_walking_after_buffer() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        assert_eq!(actor.frame().unwrap().as_str(), "alex-hola-eyes-open-mouth-closed");

        rig.run_until(&mut actor, 1299);
        assert_eq!(actor.stage(), Stage::Hola);
        rig.run_until(&mut actor, 1300);
        assert_eq!(actor.stage(), Stage::Walking);
        assert!(actor.walking().is_running());
        assert!(!actor.talking().is_running());
        assert_eq!(actor.pose(), ActorPose::Gait(GaitPose::STANDING));
        assert_eq!(rig.engine.pending_in(actor.owner(), TimerCategory::Mouth), 0);
        assert_eq!(rig.engine.pending_in(actor.owner(), TimerCategory::Leg), 1);

        let halfway = actor.position_at(SceneTime::from_millis(2300));
        assert!((halfway.x - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_full_entrance_and_continuation() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        rig.run_until(&mut actor, 3300);

        assert_eq!(actor.stage(), Stage::Static);
        assert_eq!(actor.position_at(SceneTime::from_millis(3300)), Point::new(5.0, 0.0));
        assert_eq!(rig.engine.pending_for(actor.owner()), 0);
        assert_eq!(
            rig.signals,
            vec![SceneSignal::Completed {
                actor: actor.id(),
                part: ScriptPart::Entrance,
                at: SceneTime::from_millis(3300),
            }]
        );

        assert!(actor.continue_talking(true, &mut rig.ctx()).unwrap());
        assert_eq!(actor.stage(), Stage::ArmUpTalking);
        rig.run_until(&mut actor, 4200);
        assert_eq!(actor.stage(), Stage::FinalStatic);
        assert_eq!(rig.signals.len(), 2);

        // the continuation is single-shot from FinalStatic
        actor.continue_talking(false, &mut rig.ctx()).unwrap();
        assert!(!actor.continue_talking(true, &mut rig.ctx()).unwrap());

        assert_eq!(
            rig.diagnostics.transitions(actor.id()),
            vec![
                (Stage::Initial, Stage::Hola),
                (Stage::Hola, Stage::Walking),
                (Stage::Walking, Stage::Static),
                (Stage::Static, Stage::ArmUpTalking),
                (Stage::ArmUpTalking, Stage::FinalStatic),
            ]
        );
    }

    #[test]
    fn test_disappear_only_when_settled() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        assert!(!actor.disappear(true, &mut rig.ctx()).unwrap());
        assert_eq!(actor.stage(), Stage::Hola);

        rig.run_until(&mut actor, 3300);
        actor.disappear(false, &mut rig.ctx()).unwrap();
        assert!(actor.disappear(true, &mut rig.ctx()).unwrap());
        assert_eq!(actor.stage(), Stage::Disappearing);
        assert!((actor.opacity_at(SceneTime::from_millis(3800)) - 0.5).abs() < 1e-3);

        rig.run_until(&mut actor, 4300);
        assert_eq!(actor.stage(), Stage::Done);
        assert!(actor.frame().is_none());
        assert!(matches!(
            rig.signals.last(),
            Some(SceneSignal::DisappearComplete { .. })
        ));
    }

    #[test]
    fn test_cancel_mid_disappearing_stays_silent() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        rig.run_until(&mut actor, 3300);
        actor.pulse(TriggerKind::Disappear, &mut rig.ctx()).unwrap();
        rig.run_until(&mut actor, 3700);

        let report = actor.cancel(&mut rig.ctx());
        assert_eq!(report.timers.get(TimerCategory::Animation), 1);
        rig.run_until(&mut actor, 10_000);

        assert_eq!(actor.stage(), Stage::Disappearing);
        assert!(!rig
            .signals
            .iter()
            .any(|s| matches!(s, SceneSignal::DisappearComplete { .. })));
        assert_eq!(rig.engine.pending_for(actor.owner()), 0);
    }

    #[test]
    fn test_rejected_playback_keeps_timing() {
        let mut rig = Rig::new();
        rig.playback = ScriptedPlayback::rejecting_all();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();

        assert!(actor.in_flight().is_empty());
        assert_eq!(
            rig.diagnostics
                .count(|e| matches!(e, EngineEvent::PlaybackFailed { .. })),
            1
        );
        rig.run_until(&mut actor, 1300);
        assert_eq!(actor.stage(), Stage::Walking);
    }

    #[test]
    fn test_audio_released_on_transition() {
        let mut rig = Rig::new();
        let playback = rig.playback.clone();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        assert_eq!(playback.active().len(), 1);

        rig.run_until(&mut actor, 1300);
        assert!(playback.active().is_empty());
        assert!(actor.in_flight().is_empty());
    }

    #[test]
    fn test_media_end_is_advisory() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();
        let handle = actor.in_flight()[0];

        assert!(actor.media_ended(handle));
        assert!(!actor.media_ended(handle));
        assert_eq!(actor.stage(), Stage::Hola);
        rig.run_until(&mut actor, 1299);
        assert_eq!(actor.stage(), Stage::Hola);
    }

    #[test]
    fn test_frames_stay_inside_the_set() {
        let mut rig = Rig::new();
        let mut actor = greeter(&rig.config);
        actor.start(true, &mut rig.ctx()).unwrap();

        let mut t = 0;
        while t < 1290 {
            t += 10;
            rig.run_until(&mut actor, t);
            let frame = actor.frame().unwrap();
            let set = actor.expressions().get(names::HOLA).unwrap();
            assert!(set.contains(frame), "{} escaped the hola set", frame);
        }
    }
}
