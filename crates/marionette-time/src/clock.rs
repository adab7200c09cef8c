//! Clock implementations for the scene timer engine

use std::time::{Duration, Instant};

use marionette_core::SceneTime;

/// Largest step a wall clock hands out at once
pub const MAX_WALL_STEP: Duration = Duration::from_millis(100);

/// Scene clock - virtual, monotonic, host-driven
/// INVARIANT: never moves backwards
#[derive(Clone, Debug, Default)]
pub struct SceneClock {
    value: SceneTime,
}

impl SceneClock {
    /// Create a new scene clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scene time
    #[inline]
    pub fn now(&self) -> SceneTime {
        self.value
    }

    /// Advance by a duration, returns the new time
    pub fn advance(&mut self, dt: Duration) -> SceneTime {
        self.value = self.value + dt;
        self.value
    }

    /// Move to `target` if it lies ahead; earlier targets are ignored
    pub fn advance_to(&mut self, target: SceneTime) -> SceneTime {
        if target > self.value {
            self.value = target;
        }
        self.value
    }
}

/// Wall clock - turns host instants into scene steps
pub struct WallClock {
    /// Last observed instant
    last: Instant,
    /// Largest step handed out per tick
    max_step: Duration,
}

impl WallClock {
    pub fn new(start: Instant) -> Self {
        Self::with_max_step(start, MAX_WALL_STEP)
    }

    pub fn with_max_step(start: Instant, max_step: Duration) -> Self {
        WallClock {
            last: start,
            max_step,
        }
    }

    /// Elapsed time since the previous tick.
    /// Clamped so a suspended host (sleep, background tab) does not
    /// fast-forward the scene through many stages at once.
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed.min(self.max_step)
    }

    pub fn max_step(&self) -> Duration {
        self.max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_clock_advance() {
        let mut clock = SceneClock::new();
        clock.advance(Duration::from_millis(150));
        assert_eq!(clock.now(), SceneTime::from_millis(150));
    }

    #[test]
    fn test_scene_clock_monotonic() {
        let mut clock = SceneClock::new();
        clock.advance_to(SceneTime::from_millis(500));
        clock.advance_to(SceneTime::from_millis(200));
        assert_eq!(clock.now(), SceneTime::from_millis(500));
    }

    #[test]
    fn test_wall_clock_clamps_large_steps() {
        let start = Instant::now();
        let mut clock = WallClock::new(start);

        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert_eq!(dt, Duration::from_millis(16));

        // Host suspended for five seconds
        let dt = clock.tick_at(start + Duration::from_millis(5016));
        assert_eq!(dt, MAX_WALL_STEP);
    }

    #[test]
    fn test_wall_clock_ignores_earlier_instants() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = WallClock::new(start);
        assert_eq!(clock.tick_at(start - Duration::from_millis(10)), Duration::ZERO);
    }
}
