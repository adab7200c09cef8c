//! Actor scripts
//!
//! A script is the static description of one actor's behaviour: the phases
//! of its entrance, an optional continuation played from `Static` on an
//! external trigger, and how it disappears. Phases map one-to-one onto
//! stages; each phase names the expression set its frames come from.

use std::time::Duration;

use marionette_core::{ActorId, AudioCue, MarionetteError, MarionetteResult, PoseKind, Stage};
use marionette_visual::{names, ExpressionTable, Point};
use serde::{Deserialize, Serialize};

/// One scripted phase
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Phase {
    /// Talk through a cue list, one talking driver run per cue
    Speak {
        stage: Stage,
        set: String,
        cues: Vec<AudioCue>,
    },
    /// Walk to a point; the tween duration bounds the walking driver
    Travel {
        stage: Stage,
        set: String,
        to: Point,
        #[serde(rename = "duration_ms", with = "marionette_core::millis")]
        duration: Duration,
    },
    /// Stand idle; ends the phase list
    Settle { stage: Stage, set: String },
}

impl Phase {
    pub fn stage(&self) -> Stage {
        match self {
            Phase::Speak { stage, .. } | Phase::Travel { stage, .. } | Phase::Settle { stage, .. } => {
                *stage
            }
        }
    }

    pub fn set(&self) -> &str {
        match self {
            Phase::Speak { set, .. } | Phase::Travel { set, .. } | Phase::Settle { set, .. } => set,
        }
    }

    /// Pose kind the phase's set must hold, `None` if any kind will do
    fn required_kind(&self) -> Option<PoseKind> {
        match self {
            Phase::Speak { .. } => Some(PoseKind::Face),
            Phase::Travel { .. } => Some(PoseKind::Gait),
            Phase::Settle { .. } => None,
        }
    }
}

/// How an actor leaves the scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisappearSpec {
    /// Set shown (in its idle pose) while fading
    pub set: String,
    #[serde(rename = "duration_ms", with = "marionette_core::millis::option", default)]
    pub duration: Option<Duration>,
}

impl Default for DisappearSpec {
    fn default() -> Self {
        DisappearSpec {
            set: names::STATIC.to_string(),
            duration: None,
        }
    }
}

/// Which phase list an actor is playing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptPart {
    Entrance,
    Continuation,
}

/// Complete script of one actor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorScript {
    /// Position the actor appears at
    #[serde(default)]
    pub origin: Point,
    pub entrance: Vec<Phase>,
    #[serde(default)]
    pub continuation: Vec<Phase>,
    #[serde(default)]
    pub disappear: DisappearSpec,
}

fn invalid(actor: ActorId, reason: impl Into<String>) -> MarionetteError {
    MarionetteError::InvalidScript {
        actor,
        reason: reason.into(),
    }
}

impl ActorScript {
    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    pub fn phases(&self, part: ScriptPart) -> &[Phase] {
        match part {
            ScriptPart::Entrance => &self.entrance,
            ScriptPart::Continuation => &self.continuation,
        }
    }

    /// Stage the entrance settles in
    pub fn settles_in(&self) -> Option<Stage> {
        self.entrance.last().map(Phase::stage)
    }

    /// Every cue of the script, in play order
    pub fn cues(&self) -> impl Iterator<Item = &AudioCue> {
        self.entrance
            .iter()
            .chain(self.continuation.iter())
            .filter_map(|phase| match phase {
                Phase::Speak { cues, .. } => Some(cues.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Check the script against the stage machine and the actor's expression table
    pub fn validate(&self, actor: ActorId, table: &ExpressionTable) -> MarionetteResult<()> {
        if self.entrance.is_empty() {
            return Err(invalid(actor, "entrance has no phases"));
        }
        self.validate_part(actor, table, ScriptPart::Entrance, Stage::Initial)?;

        if !self.continuation.is_empty() {
            let settled = self.settles_in().unwrap_or(Stage::Initial);
            if !settled.accepts_continuation() {
                return Err(invalid(
                    actor,
                    format!("continuation is unreachable, entrance settles in {}", settled),
                ));
            }
            if !self.continuation[0].stage().is_continuation() {
                return Err(invalid(
                    actor,
                    format!(
                        "continuation must open with a continuation stage, not {}",
                        self.continuation[0].stage()
                    ),
                ));
            }
            self.validate_part(actor, table, ScriptPart::Continuation, settled)?;
        }

        if !table.contains(&self.disappear.set) {
            return Err(invalid(
                actor,
                format!("disappear set {} is not in the expression table", self.disappear.set),
            ));
        }
        Ok(())
    }

    fn validate_part(
        &self,
        actor: ActorId,
        table: &ExpressionTable,
        part: ScriptPart,
        from: Stage,
    ) -> MarionetteResult<()> {
        let phases = self.phases(part);
        let mut previous = from;

        for (index, phase) in phases.iter().enumerate() {
            let stage = phase.stage();
            let is_last = index + 1 == phases.len();

            if matches!(stage, Stage::Initial | Stage::Disappearing | Stage::Done) {
                return Err(invalid(actor, format!("{} cannot be scripted", stage)));
            }
            if part == ScriptPart::Entrance && stage.is_continuation() {
                return Err(invalid(actor, format!("{} belongs to the continuation", stage)));
            }
            if !Stage::permits(previous, stage) {
                return Err(invalid(actor, format!("{} cannot follow {}", stage, previous)));
            }

            match phase {
                Phase::Speak { cues, .. } if cues.is_empty() => {
                    return Err(invalid(actor, format!("{} has no cues", stage)));
                }
                Phase::Settle { .. } if !is_last => {
                    return Err(invalid(actor, format!("settle phase {} is not last", stage)));
                }
                Phase::Settle { .. } if !stage.is_settled() => {
                    return Err(invalid(actor, format!("{} is not a settled stage", stage)));
                }
                _ => {}
            }
            if is_last && !matches!(phase, Phase::Settle { .. }) {
                return Err(invalid(actor, format!("{:?} must end in a settle phase", part)));
            }

            let set = table
                .get(phase.set())
                .map_err(|_| invalid(actor, format!("{} uses unknown set {}", stage, phase.set())))?;
            if let Some(kind) = phase.required_kind() {
                if set.kind() != kind {
                    return Err(invalid(
                        actor,
                        format!("{} needs a {} set, {} holds {} frames", stage, kind, phase.set(), set.kind()),
                    ));
                }
            }

            previous = stage;
        }
        Ok(())
    }

    /// Greets, walks in, delivers a monologue, walks to the side and waits.
    /// On `continueTalking` raises an arm for an encore and settles for good.
    pub fn presenter(
        greeting: Vec<AudioCue>,
        monologue: Vec<AudioCue>,
        encore: Vec<AudioCue>,
        stations: [Point; 3],
    ) -> Self {
        let [walk_to, exit_to, side_to] = stations;
        let builder = ActorScript::builder()
            .speak(Stage::Hola, names::HOLA, greeting)
            .travel(Stage::Walking, names::WALKING, walk_to, Duration::from_millis(2500))
            .speak(Stage::Talking, names::TALKING, monologue)
            .travel(Stage::FinalWalking, names::WALKING, exit_to, Duration::from_millis(3500))
            .travel(Stage::SideMoving, names::WALKING, side_to, Duration::from_millis(2000))
            .settle(Stage::Static, names::STATIC);

        let builder = if encore.is_empty() {
            builder
        } else {
            builder
                .continuation()
                .speak(Stage::ArmUpTalking, names::ARM_UP_TALKING, encore)
                .settle(Stage::FinalStatic, names::STATIC)
        };
        builder.build()
    }

    /// Walks to a spot, says its lines and waits there
    pub fn walker(lines: Vec<AudioCue>, to: Point) -> Self {
        ActorScript::builder()
            .travel(Stage::Walking, names::WALKING, to, Duration::from_millis(3000))
            .speak(Stage::Talking, names::TALKING, lines)
            .settle(Stage::Static, names::STATIC)
            .build()
    }
}

/// Builder for [`ActorScript`]; phases go to the entrance until
/// [`ScriptBuilder::continuation`] is called
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    script: ActorScript,
    part: Option<ScriptPart>,
}

impl ScriptBuilder {
    fn push(mut self, phase: Phase) -> Self {
        match self.part.unwrap_or(ScriptPart::Entrance) {
            ScriptPart::Entrance => self.script.entrance.push(phase),
            ScriptPart::Continuation => self.script.continuation.push(phase),
        }
        self
    }

    pub fn origin(mut self, origin: Point) -> Self {
        self.script.origin = origin;
        self
    }

    pub fn speak(self, stage: Stage, set: &str, cues: Vec<AudioCue>) -> Self {
        self.push(Phase::Speak {
            stage,
            set: set.to_string(),
            cues,
        })
    }

    pub fn travel(self, stage: Stage, set: &str, to: Point, duration: Duration) -> Self {
        self.push(Phase::Travel {
            stage,
            set: set.to_string(),
            to,
            duration,
        })
    }

    pub fn settle(self, stage: Stage, set: &str) -> Self {
        self.push(Phase::Settle {
            stage,
            set: set.to_string(),
        })
    }

    /// Following phases form the continuation
    pub fn continuation(mut self) -> Self {
        self.part = Some(ScriptPart::Continuation);
        self
    }

    pub fn disappear(mut self, set: &str, duration: Duration) -> Self {
        self.script.disappear = DisappearSpec {
            set: set.to_string(),
            duration: Some(duration),
        };
        self
    }

    pub fn build(self) -> ActorScript {
        self.script
    }
}
