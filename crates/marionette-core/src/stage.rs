//! Actor stages
//!
//! A stage is one phase of an actor's scripted behavior. Exactly one stage is
//! active per actor. Stages run forward in declaration order; the only
//! backwards edge is the return from a continuation back to `Static`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Actor stage (closed enumeration, ordered)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Mounted but not started, renders nothing
    #[default]
    Initial,
    /// Greeting cue
    Hola,
    /// Entrance walk
    Walking,
    /// Main monologue
    Talking,
    /// Walk after the monologue
    FinalWalking,
    /// Lateral move into the resting spot
    SideMoving,
    /// Resting, waiting for external triggers
    Static,
    /// Extra dialogue started from `Static`
    ContinueTalking,
    /// Extra dialogue with the arm raised, started from `Static`
    ArmUpTalking,
    /// Resting after the continuation
    FinalStatic,
    /// Fading out
    Disappearing,
    /// Gone, renders nothing
    Done,
}

impl Stage {
    /// All stages in order
    pub const ALL: [Stage; 12] = [
        Stage::Initial,
        Stage::Hola,
        Stage::Walking,
        Stage::Talking,
        Stage::FinalWalking,
        Stage::SideMoving,
        Stage::Static,
        Stage::ContinueTalking,
        Stage::ArmUpTalking,
        Stage::FinalStatic,
        Stage::Disappearing,
        Stage::Done,
    ];

    /// Is `from -> to` a legal transition?
    pub fn permits(from: Stage, to: Stage) -> bool {
        match (from, to) {
            (Stage::Disappearing, Stage::Done) => true,
            (_, Stage::Done) => false,
            (Stage::ContinueTalking | Stage::ArmUpTalking, Stage::Static) => true,
            (Stage::Done, _) => false,
            _ => to > from,
        }
    }

    /// Resting stages that accept a `disappear` trigger
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, Stage::Static | Stage::FinalStatic)
    }

    /// Only `Static` accepts a `continueTalking` trigger
    #[inline]
    pub fn accepts_continuation(self) -> bool {
        self == Stage::Static
    }

    /// Stages in which nothing is painted
    #[inline]
    pub fn is_invisible(self) -> bool {
        matches!(self, Stage::Initial | Stage::Done)
    }

    /// Continuation stages (the ones that may loop back to `Static`)
    #[inline]
    pub fn is_continuation(self) -> bool {
        matches!(self, Stage::ContinueTalking | Stage::ArmUpTalking)
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Hola => "hola",
            Stage::Walking => "walking",
            Stage::Talking => "talking",
            Stage::FinalWalking => "finalWalking",
            Stage::SideMoving => "sideMoving",
            Stage::Static => "static",
            Stage::ContinueTalking => "continueTalking",
            Stage::ArmUpTalking => "armUpTalking",
            Stage::FinalStatic => "finalStatic",
            Stage::Disappearing => "disappearing",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
