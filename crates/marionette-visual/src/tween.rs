//! Tweens for travel stages and the disappearance fade

use std::time::Duration;

use marionette_core::SceneTime;
use serde::{Deserialize, Serialize};

/// Stage position in renderer units
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Interpolate towards `other`
    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Fraction of `duration` elapsed since `start`, in [0, 1]
pub fn progress(start: SceneTime, duration: Duration, now: SceneTime) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.since(start).as_secs_f64();
    (elapsed / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
}

/// Position tween of fixed wall-clock duration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub from: Point,
    pub to: Point,
    pub start: SceneTime,
    pub duration: Duration,
}

impl Motion {
    pub fn new(from: Point, to: Point, start: SceneTime, duration: Duration) -> Self {
        Motion {
            from,
            to,
            start,
            duration,
        }
    }

    pub fn position_at(&self, now: SceneTime) -> Point {
        self.from.lerp(&self.to, progress(self.start, self.duration, now))
    }

    pub fn ends_at(&self) -> SceneTime {
        self.start + self.duration
    }
}

/// Opacity fade from fully visible to gone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    pub start: SceneTime,
    pub duration: Duration,
}

impl Fade {
    pub fn new(start: SceneTime, duration: Duration) -> Self {
        Fade { start, duration }
    }

    pub fn opacity_at(&self, now: SceneTime) -> f32 {
        1.0 - progress(self.start, self.duration, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_interpolates() {
        let motion = Motion::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            SceneTime::from_millis(1000),
            Duration::from_millis(2000),
        );
        assert_eq!(motion.position_at(SceneTime::ZERO), Point::new(0.0, 0.0));
        let mid = motion.position_at(SceneTime::from_millis(2000));
        assert!((mid.x - 50.0).abs() < 0.01);
        assert!((mid.y - 25.0).abs() < 0.01);
        assert_eq!(motion.position_at(SceneTime::from_millis(9000)), Point::new(100.0, 50.0));
        assert_eq!(motion.ends_at(), SceneTime::from_millis(3000));
    }

    #[test]
    fn test_fade() {
        let fade = Fade::new(SceneTime::ZERO, Duration::from_millis(1000));
        assert_eq!(fade.opacity_at(SceneTime::ZERO), 1.0);
        assert!((fade.opacity_at(SceneTime::from_millis(250)) - 0.75).abs() < 0.01);
        assert_eq!(fade.opacity_at(SceneTime::from_millis(1000)), 0.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        assert_eq!(progress(SceneTime::ZERO, Duration::ZERO, SceneTime::ZERO), 1.0);
    }
}
