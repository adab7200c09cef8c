//! Expression tables
//!
//! An expression set maps every combination of its pose axes to exactly one
//! frame, so lookups are total: a driver cannot produce a pose its set has
//! no frame for.

use std::collections::BTreeMap;
use std::fmt;

use marionette_core::{
    ActorPose, FacePose, GaitPose, Leg, MarionetteError, MarionetteResult, PoseKind,
};
use serde::{Deserialize, Serialize};

/// Conventional set names used by the bundled scripts
pub mod names {
    pub const HOLA: &str = "hola";
    pub const TALKING: &str = "talking";
    pub const WALKING: &str = "walking";
    pub const STATIC: &str = "static";
    pub const ARM_UP_TALKING: &str = "armUpTalking";
}

/// Stable identifier of a renderable frame
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRef(pub String);

impl FrameRef {
    pub fn new(name: impl Into<String>) -> Self {
        FrameRef(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

impl fmt::Display for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Face frames: eyes × mouth
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSet {
    pub eyes_open_mouth_closed: FrameRef,
    pub eyes_open_mouth_open: FrameRef,
    pub eyes_closed_mouth_closed: FrameRef,
    pub eyes_closed_mouth_open: FrameRef,
}

impl FaceSet {
    /// Set whose frames are named `{prefix}-eyes-{open|closed}-mouth-{open|closed}`
    pub fn prefixed(prefix: &str) -> Self {
        let frame = |eyes: &str, mouth: &str| FrameRef(format!("{prefix}-eyes-{eyes}-mouth-{mouth}"));
        FaceSet {
            eyes_open_mouth_closed: frame("open", "closed"),
            eyes_open_mouth_open: frame("open", "open"),
            eyes_closed_mouth_closed: frame("closed", "closed"),
            eyes_closed_mouth_open: frame("closed", "open"),
        }
    }

    pub fn frame(&self, pose: FacePose) -> &FrameRef {
        match (pose.eyes_open, pose.mouth_open) {
            (true, false) => &self.eyes_open_mouth_closed,
            (true, true) => &self.eyes_open_mouth_open,
            (false, false) => &self.eyes_closed_mouth_closed,
            (false, true) => &self.eyes_closed_mouth_open,
        }
    }

    fn frames(&self) -> [&FrameRef; 4] {
        [
            &self.eyes_open_mouth_closed,
            &self.eyes_open_mouth_open,
            &self.eyes_closed_mouth_closed,
            &self.eyes_closed_mouth_open,
        ]
    }
}

/// Gait frames: leg × eyes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaitSet {
    pub left_eyes_open: FrameRef,
    pub right_eyes_open: FrameRef,
    pub left_eyes_closed: FrameRef,
    pub right_eyes_closed: FrameRef,
}

impl GaitSet {
    /// Set whose frames are named `{prefix}-{left|right}-eyes-{open|closed}`
    pub fn prefixed(prefix: &str) -> Self {
        let frame = |leg: &str, eyes: &str| FrameRef(format!("{prefix}-{leg}-eyes-{eyes}"));
        GaitSet {
            left_eyes_open: frame("left", "open"),
            right_eyes_open: frame("right", "open"),
            left_eyes_closed: frame("left", "closed"),
            right_eyes_closed: frame("right", "closed"),
        }
    }

    pub fn frame(&self, pose: GaitPose) -> &FrameRef {
        match (pose.leg, pose.eyes_open) {
            (Leg::Left, true) => &self.left_eyes_open,
            (Leg::Right, true) => &self.right_eyes_open,
            (Leg::Left, false) => &self.left_eyes_closed,
            (Leg::Right, false) => &self.right_eyes_closed,
        }
    }

    fn frames(&self) -> [&FrameRef; 4] {
        [
            &self.left_eyes_open,
            &self.right_eyes_open,
            &self.left_eyes_closed,
            &self.right_eyes_closed,
        ]
    }
}

/// One named group of frames
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpressionSet {
    Face(FaceSet),
    Gait(GaitSet),
}

impl ExpressionSet {
    pub fn kind(&self) -> PoseKind {
        match self {
            ExpressionSet::Face(_) => PoseKind::Face,
            ExpressionSet::Gait(_) => PoseKind::Gait,
        }
    }

    /// Resting pose for this set
    pub fn idle_pose(&self) -> ActorPose {
        match self {
            ExpressionSet::Face(_) => ActorPose::Face(FacePose::IDLE),
            ExpressionSet::Gait(_) => ActorPose::Gait(GaitPose::STANDING),
        }
    }

    /// Frame for a pose, `None` if the pose belongs to the other axis family
    pub fn frame(&self, pose: ActorPose) -> Option<&FrameRef> {
        match (self, pose) {
            (ExpressionSet::Face(set), ActorPose::Face(p)) => Some(set.frame(p)),
            (ExpressionSet::Gait(set), ActorPose::Gait(p)) => Some(set.frame(p)),
            _ => None,
        }
    }

    pub fn contains(&self, frame: &FrameRef) -> bool {
        match self {
            ExpressionSet::Face(set) => set.frames().contains(&frame),
            ExpressionSet::Gait(set) => set.frames().contains(&frame),
        }
    }
}

/// All expression sets of one actor, keyed by set name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionTable {
    sets: BTreeMap<String, ExpressionSet>,
}

impl ExpressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, set: ExpressionSet) -> Self {
        self.insert(name, set);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, set: ExpressionSet) {
        self.sets.insert(name.into(), set);
    }

    /// Table with the conventional sets, frames named after `actor`
    pub fn conventional(actor: &str) -> Self {
        Self::new()
            .with(names::HOLA, ExpressionSet::Face(FaceSet::prefixed(&format!("{actor}-hola"))))
            .with(names::TALKING, ExpressionSet::Face(FaceSet::prefixed(&format!("{actor}-talking"))))
            .with(names::WALKING, ExpressionSet::Gait(GaitSet::prefixed(&format!("{actor}-walking"))))
            .with(names::STATIC, ExpressionSet::Face(FaceSet::prefixed(&format!("{actor}-static"))))
            .with(
                names::ARM_UP_TALKING,
                ExpressionSet::Face(FaceSet::prefixed(&format!("{actor}-arm-up"))),
            )
    }

    pub fn get(&self, name: &str) -> MarionetteResult<&ExpressionSet> {
        self.sets
            .get(name)
            .ok_or_else(|| MarionetteError::UnknownExpressionSet(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Look a pose up in a named set
    pub fn resolve(&self, name: &str, pose: ActorPose) -> MarionetteResult<&FrameRef> {
        let set = self.get(name)?;
        set.frame(pose).ok_or_else(|| MarionetteError::PoseMismatch {
            set: name.to_string(),
            expected: set.kind(),
            actual: pose.kind(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
