//! Time primitives for the sequencing engine
//!
//! Scene time is virtual: it starts at zero when a scene mounts and only
//! advances when the host drives the scene's timer queue.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Scene time - monotonic, virtual, host-driven
/// Represented as microseconds since scene mount
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SceneTime(pub u64);

impl SceneTime {
    pub const ZERO: SceneTime = SceneTime(0);
    pub const MAX: SceneTime = SceneTime(u64::MAX);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        SceneTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        SceneTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        SceneTime(self.0.saturating_add(duration_micros(duration)))
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: SceneTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[inline]
fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl Add<Duration> for SceneTime {
    type Output = SceneTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<SceneTime> for SceneTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: SceneTime) -> Self::Output {
        self.since(rhs)
    }
}

impl std::fmt::Debug for SceneTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}ms)", self.0 as f64 / 1000.0)
    }
}
