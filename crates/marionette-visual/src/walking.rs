//! Walking frame driver
//!
//! One repeating timer alternates the legs; on each tick the eyes may also
//! flip. No duration is supplied: the enclosing travel tween stops the driver
//! when it completes.

use std::time::Duration;

use marionette_core::{GaitPose, TimerId};
use marionette_time::{TimerCategory, TimerEngine, TimerOwner};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{chance, DriverTimer};

/// Walking driver configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// Leg alternation period
    #[serde(rename = "leg_period_ms", with = "marionette_core::millis")]
    pub leg_period: Duration,
    /// Chance of flipping the eyes per leg tick
    pub blink_chance: f64,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        WalkingConfig {
            leg_period: Duration::from_millis(200),
            blink_chance: 0.10,
        }
    }
}

/// Walking driver for one actor
#[derive(Debug)]
pub struct WalkingDriver {
    owner: TimerOwner,
    config: WalkingConfig,
    pose: GaitPose,
    leg: Option<TimerId>,
}

impl WalkingDriver {
    pub fn new(owner: TimerOwner, config: WalkingConfig) -> Self {
        WalkingDriver {
            owner,
            config,
            pose: GaitPose::STANDING,
            leg: None,
        }
    }

    /// Start (or restart) the leg timer
    pub fn start<P: From<DriverTimer>>(&mut self, engine: &mut TimerEngine<P>) {
        self.halt(engine);
        debug!(owner = ?self.owner, period_ms = self.config.leg_period.as_millis() as u64, "walking driver started");
        self.leg = Some(engine.every(
            self.owner,
            TimerCategory::Leg,
            self.config.leg_period,
            DriverTimer::LegTick.into(),
        ));
    }

    /// Leg tick: alternate legs, maybe blink
    pub fn on_leg_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GaitPose {
        self.pose = self.pose.step();
        if chance(rng, self.config.blink_chance) {
            self.pose = self.pose.toggle_eyes();
        }
        self.pose
    }

    /// Travel finished: cancel the leg timer and stand still
    pub fn stop<P>(&mut self, engine: &mut TimerEngine<P>) -> GaitPose {
        self.halt(engine);
        self.pose = GaitPose::STANDING;
        self.pose
    }

    pub fn halt<P>(&mut self, engine: &mut TimerEngine<P>) {
        if let Some(id) = self.leg.take() {
            engine.cancel(id);
        }
    }

    /// Forget the timer handle after the owner's timers were cancelled wholesale
    pub fn detach(&mut self) {
        self.leg = None;
    }

    pub fn pose(&self) -> GaitPose {
        self.pose
    }

    pub fn is_running(&self) -> bool {
        self.leg.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{ActorId, Leg, SceneTime};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OWNER: TimerOwner = TimerOwner::Actor(ActorId(4));

    #[test]
    fn test_legs_alternate_every_tick() {
        let mut engine: TimerEngine<DriverTimer> = TimerEngine::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut d = WalkingDriver::new(OWNER, WalkingConfig::default());
        d.start(&mut engine);

        let mut legs = Vec::new();
        while let Some(fired) = engine.pop_until(SceneTime::from_millis(1000)) {
            assert_eq!(fired.payload, DriverTimer::LegTick);
            legs.push(d.on_leg_tick(&mut rng).leg);
        }
        assert_eq!(legs.len(), 5);
        assert_eq!(legs, vec![Leg::Right, Leg::Left, Leg::Right, Leg::Left, Leg::Right]);
    }

    #[test]
    fn test_restart_keeps_single_leg_timer() {
        let mut engine: TimerEngine<DriverTimer> = TimerEngine::new();
        let mut d = WalkingDriver::new(OWNER, WalkingConfig::default());
        d.start(&mut engine);
        d.start(&mut engine);
        assert_eq!(engine.pending_in(OWNER, TimerCategory::Leg), 1);
    }

    #[test]
    fn test_stop_stands_still() {
        let mut engine: TimerEngine<DriverTimer> = TimerEngine::new();
        let mut rng = StdRng::seed_from_u64(2);
        let mut d = WalkingDriver::new(OWNER, WalkingConfig::default());
        d.start(&mut engine);
        d.on_leg_tick(&mut rng);
        let pose = d.stop(&mut engine);
        assert_eq!(pose, GaitPose::STANDING);
        assert!(!d.is_running());
        assert_eq!(engine.pending_for(OWNER), 0);
    }

    #[test]
    fn test_blink_is_orthogonal_to_legs() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut d = WalkingDriver::new(
            OWNER,
            WalkingConfig {
                blink_chance: 1.0,
                ..WalkingConfig::default()
            },
        );
        let first = d.on_leg_tick(&mut rng);
        assert_eq!(first.leg, Leg::Right);
        assert!(!first.eyes_open);
        let second = d.on_leg_tick(&mut rng);
        assert_eq!(second.leg, Leg::Left);
        assert!(second.eyes_open);
    }
}
