//! Pose axes
//!
//! A pose is a small set of discrete boolean axes. Frames are looked up from
//! typed poses, never inferred from frame names.

use serde::{Deserialize, Serialize};

/// Face pose: eyes × mouth
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacePose {
    pub eyes_open: bool,
    pub mouth_open: bool,
}

impl FacePose {
    /// Canonical idle pose: eyes open, mouth closed
    pub const IDLE: FacePose = FacePose {
        eyes_open: true,
        mouth_open: false,
    };

    /// Flip the mouth axis, keep the eyes
    #[inline]
    pub fn toggle_mouth(self) -> Self {
        FacePose {
            mouth_open: !self.mouth_open,
            ..self
        }
    }

    /// Flip the eye axis, keep the mouth
    #[inline]
    pub fn toggle_eyes(self) -> Self {
        FacePose {
            eyes_open: !self.eyes_open,
            ..self
        }
    }

    #[inline]
    pub fn with_mouth_closed(self) -> Self {
        FacePose {
            mouth_open: false,
            ..self
        }
    }
}

impl Default for FacePose {
    fn default() -> Self {
        FacePose::IDLE
    }
}

/// Which leg is forward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    #[default]
    Left,
    Right,
}

impl Leg {
    #[inline]
    pub fn other(self) -> Leg {
        match self {
            Leg::Left => Leg::Right,
            Leg::Right => Leg::Left,
        }
    }
}

/// Gait pose: leg × eyes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GaitPose {
    pub leg: Leg,
    pub eyes_open: bool,
}

impl GaitPose {
    /// Canonical standing pose: left leg, eyes open
    pub const STANDING: GaitPose = GaitPose {
        leg: Leg::Left,
        eyes_open: true,
    };

    #[inline]
    pub fn step(self) -> Self {
        GaitPose {
            leg: self.leg.other(),
            ..self
        }
    }

    #[inline]
    pub fn toggle_eyes(self) -> Self {
        GaitPose {
            eyes_open: !self.eyes_open,
            ..self
        }
    }
}

impl Default for GaitPose {
    fn default() -> Self {
        GaitPose::STANDING
    }
}

/// Pose of an actor, tagged with the axis family it belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorPose {
    Face(FacePose),
    Gait(GaitPose),
}

impl ActorPose {
    pub fn kind(&self) -> PoseKind {
        match self {
            ActorPose::Face(_) => PoseKind::Face,
            ActorPose::Gait(_) => PoseKind::Gait,
        }
    }
}

impl Default for ActorPose {
    fn default() -> Self {
        ActorPose::Face(FacePose::IDLE)
    }
}

/// Axis family of a pose or expression set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseKind {
    Face,
    Gait,
}

impl std::fmt::Display for PoseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoseKind::Face => f.write_str("face"),
            PoseKind::Gait => f.write_str("gait"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouth_toggle_preserves_eyes() {
        let pose = FacePose {
            eyes_open: false,
            mouth_open: false,
        };
        let toggled = pose.toggle_mouth();
        assert!(!toggled.eyes_open);
        assert!(toggled.mouth_open);
        assert_eq!(toggled.toggle_mouth(), pose);
    }

    #[test]
    fn test_eye_toggle_preserves_mouth() {
        let pose = FacePose {
            eyes_open: true,
            mouth_open: true,
        };
        let toggled = pose.toggle_eyes();
        assert!(!toggled.eyes_open);
        assert!(toggled.mouth_open);
    }

    #[test]
    fn test_gait_step_alternates() {
        let pose = GaitPose::STANDING;
        assert_eq!(pose.step().leg, Leg::Right);
        assert_eq!(pose.step().step(), pose);
        assert_eq!(pose.toggle_eyes().leg, Leg::Left);
    }

    #[test]
    fn test_pose_kind() {
        assert_eq!(ActorPose::default().kind(), PoseKind::Face);
        assert_eq!(ActorPose::Gait(GaitPose::STANDING).kind(), PoseKind::Gait);
    }
}
