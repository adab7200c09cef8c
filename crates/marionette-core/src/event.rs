//! Diagnostic events
//!
//! Everything the engine does that a test or an operator may want to observe
//! is reported as an [`EngineEvent`]. Ignored triggers and dropped cascade
//! steps are not errors, but they are always recorded here.

use crate::{ActorId, SceneTime, Stage, TriggerKind};

/// Frame driver family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Talking driver, brisk cadence
    Talking,
    /// Talking driver, measured cadence with speech pauses
    MeasuredTalking,
    /// Leg-alternation driver
    Walking,
}

/// Diagnostic event emitted by a scene
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// An actor entered a new stage. `pending_after_cleanup` is the number of
    /// timers still attributed to the actor right after the cleanup gate ran
    /// and before the next driver started.
    StageChanged {
        actor: ActorId,
        from: Stage,
        to: Stage,
        at: SceneTime,
        pending_after_cleanup: usize,
    },
    /// The cleanup gate ran for an actor
    CleanupRan {
        actor: ActorId,
        at: SceneTime,
        timers_cleared: usize,
        audio_released: usize,
    },
    /// A trigger arrived while the actor was not in an eligible stage
    TriggerIgnored {
        actor: ActorId,
        trigger: TriggerKind,
        stage: Stage,
        at: SceneTime,
    },
    /// The playback service rejected a cue; timing continues on the declared duration
    PlaybackFailed {
        actor: ActorId,
        cue: String,
        reason: String,
        at: SceneTime,
    },
    /// Advisory media end notification
    MediaEnded {
        actor: Option<ActorId>,
        handle: u64,
        at: SceneTime,
    },
    /// The disappearance cascade reached an actor that could not disappear
    CascadeDropped {
        actor: ActorId,
        stage: Stage,
        at: SceneTime,
    },
    /// A frame driver started
    DriverStarted {
        actor: ActorId,
        driver: DriverKind,
        at: SceneTime,
    },
}

impl EngineEvent {
    /// Actor the event is about, if any
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            EngineEvent::StageChanged { actor, .. }
            | EngineEvent::CleanupRan { actor, .. }
            | EngineEvent::TriggerIgnored { actor, .. }
            | EngineEvent::PlaybackFailed { actor, .. }
            | EngineEvent::CascadeDropped { actor, .. }
            | EngineEvent::DriverStarted { actor, .. } => Some(*actor),
            EngineEvent::MediaEnded { actor, .. } => *actor,
        }
    }

    /// Scene time at which the event happened
    pub fn at(&self) -> SceneTime {
        match self {
            EngineEvent::StageChanged { at, .. }
            | EngineEvent::CleanupRan { at, .. }
            | EngineEvent::TriggerIgnored { at, .. }
            | EngineEvent::PlaybackFailed { at, .. }
            | EngineEvent::MediaEnded { at, .. }
            | EngineEvent::CascadeDropped { at, .. }
            | EngineEvent::DriverStarted { at, .. } => *at,
        }
    }
}
