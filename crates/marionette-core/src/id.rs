//! Identity types for the sequencing engine
//!
//! All identifiers are plain 64-bit values scoped to a single scene.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Actor identity - one on-screen character within a scene
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl ActorId {
    pub const ZERO: ActorId = ActorId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        ActorId(id)
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({:04x})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Scene identity - one mounted page/scene
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u64);

impl SceneId {
    pub const ZERO: SceneId = SceneId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        SceneId(id)
    }
}

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene({:04x})", self.0)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Timer handle - unique within a timer queue, never reused
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimerId(pub u64);

impl TimerId {
    #[inline]
    pub fn new(id: u64) -> Self {
        TimerId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        TimerId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({})", self.0)
    }
}
