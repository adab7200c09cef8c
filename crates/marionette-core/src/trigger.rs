//! Edge-triggered scene inputs
//!
//! Scene inputs are booleans. Actors react to the false -> true edge, never
//! to the steady level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which input of an actor a trigger targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Start,
    ContinueTalking,
    Disappear,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Start => f.write_str("start"),
            TriggerKind::ContinueTalking => f.write_str("continueTalking"),
            TriggerKind::Disappear => f.write_str("disappear"),
        }
    }
}

/// Remembers the last level of a boolean input and reports rising edges
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeLatch {
    level: bool,
}

impl EdgeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a new level. Returns true only on a false -> true transition.
    #[inline]
    pub fn feed(&mut self, level: bool) -> bool {
        let rising = level && !self.level;
        self.level = level;
        rising
    }

    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }
}
