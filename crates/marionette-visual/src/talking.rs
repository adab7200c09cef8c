//! Talking frame driver
//!
//! Two independent repeating timers (mouth and eyes) plus a single stop timer
//! bounded by the cue's declared duration. Each tick reads the current pose
//! and flips one axis, so the driver can be interrupted and restarted at any
//! point without drifting.

use std::time::Duration;

use marionette_core::{DriverKind, FacePose, SceneTime, TimerId};
use marionette_time::{TimerCategory, TimerEngine, TimerOwner};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{chance, DriverTimer};

/// Talking cadence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// Regular speech
    Brisk,
    /// Unusually long cues: slower mouth with speech pauses
    Measured,
}

impl Cadence {
    pub fn driver_kind(self) -> DriverKind {
        match self {
            Cadence::Brisk => DriverKind::Talking,
            Cadence::Measured => DriverKind::MeasuredTalking,
        }
    }
}

/// Brisk cadence configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkingConfig {
    /// Mouth toggle period
    #[serde(rename = "mouth_period_ms", with = "marionette_core::millis")]
    pub mouth_period: Duration,
    /// Eye blink tick period
    #[serde(rename = "eye_period_ms", with = "marionette_core::millis")]
    pub eye_period: Duration,
    /// Chance of flipping the eyes per eye tick
    pub blink_chance: f64,
}

impl Default for TalkingConfig {
    fn default() -> Self {
        TalkingConfig {
            mouth_period: Duration::from_millis(150),
            eye_period: Duration::from_millis(350),
            blink_chance: 0.15,
        }
    }
}

/// Measured cadence configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasuredConfig {
    #[serde(rename = "mouth_period_ms", with = "marionette_core::millis")]
    pub mouth_period: Duration,
    #[serde(rename = "eye_period_ms", with = "marionette_core::millis")]
    pub eye_period: Duration,
    pub blink_chance: f64,
    /// Speech since talking started (or since the last pause) before a pause may begin
    #[serde(rename = "pause_after_ms", with = "marionette_core::millis")]
    pub pause_after: Duration,
    /// How long a pause holds the mouth closed
    #[serde(rename = "pause_length_ms", with = "marionette_core::millis")]
    pub pause_length: Duration,
    /// Chance per eligible mouth tick of starting a pause
    pub pause_chance: f64,
}

impl Default for MeasuredConfig {
    fn default() -> Self {
        MeasuredConfig {
            mouth_period: Duration::from_millis(275),
            eye_period: Duration::from_millis(350),
            blink_chance: 0.15,
            pause_after: Duration::from_millis(1200),
            pause_length: Duration::from_millis(1000),
            pause_chance: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct TalkTimers {
    mouth: Option<TimerId>,
    eye: Option<TimerId>,
    stop: Option<TimerId>,
}

impl TalkTimers {
    fn ids(&self) -> impl Iterator<Item = TimerId> {
        [self.mouth, self.eye, self.stop].into_iter().flatten()
    }
}

/// Talking driver for one actor
#[derive(Debug)]
pub struct TalkingDriver {
    owner: TimerOwner,
    brisk: TalkingConfig,
    measured: MeasuredConfig,
    cadence: Cadence,
    pose: FacePose,
    timers: TalkTimers,
    /// Measured cadence: start of the current speech run
    speech_since: SceneTime,
    /// Measured cadence: end of the current pause, if any
    paused_until: Option<SceneTime>,
}

impl TalkingDriver {
    pub fn new(owner: TimerOwner, brisk: TalkingConfig, measured: MeasuredConfig) -> Self {
        TalkingDriver {
            owner,
            brisk,
            measured,
            cadence: Cadence::Brisk,
            pose: FacePose::IDLE,
            timers: TalkTimers::default(),
            speech_since: SceneTime::ZERO,
            paused_until: None,
        }
    }

    /// Start (or restart) talking for `stop_after`.
    /// Any live timers of this driver are cancelled first, so a rapid
    /// re-trigger never leaves two mouth timers running.
    pub fn start<P: From<DriverTimer>>(
        &mut self,
        engine: &mut TimerEngine<P>,
        cadence: Cadence,
        stop_after: Duration,
    ) {
        self.halt(engine);
        debug!(
            owner = ?self.owner,
            cadence = ?cadence,
            stop_after_ms = stop_after.as_millis() as u64,
            "talking driver started"
        );

        let (mouth_period, eye_period) = match cadence {
            Cadence::Brisk => (self.brisk.mouth_period, self.brisk.eye_period),
            Cadence::Measured => (self.measured.mouth_period, self.measured.eye_period),
        };

        self.cadence = cadence;
        self.speech_since = engine.now();
        self.paused_until = None;
        self.timers = TalkTimers {
            mouth: Some(engine.every(
                self.owner,
                TimerCategory::Mouth,
                mouth_period,
                DriverTimer::MouthTick.into(),
            )),
            eye: Some(engine.every(
                self.owner,
                TimerCategory::Eye,
                eye_period,
                DriverTimer::EyeTick.into(),
            )),
            stop: Some(engine.after(
                self.owner,
                TimerCategory::StageDuration,
                stop_after,
                DriverTimer::TalkStop.into(),
            )),
        };
    }

    /// Mouth tick: flip the mouth axis, or hold it closed during a pause
    pub fn on_mouth_tick<R: Rng + ?Sized>(&mut self, now: SceneTime, rng: &mut R) -> FacePose {
        if self.cadence == Cadence::Measured {
            if let Some(until) = self.paused_until {
                if now < until {
                    self.pose = self.pose.with_mouth_closed();
                    return self.pose;
                }
                self.paused_until = None;
                self.speech_since = now;
            }

            if now.since(self.speech_since) >= self.measured.pause_after
                && chance(rng, self.measured.pause_chance)
            {
                self.paused_until = Some(now + self.measured.pause_length);
                trace!(owner = ?self.owner, at_ms = now.as_millis(), "speech pause");
                self.pose = self.pose.with_mouth_closed();
                return self.pose;
            }
        }

        self.pose = self.pose.toggle_mouth();
        self.pose
    }

    /// Eye tick: flip the eye axis with the configured probability
    pub fn on_eye_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> FacePose {
        let blink = match self.cadence {
            Cadence::Brisk => self.brisk.blink_chance,
            Cadence::Measured => self.measured.blink_chance,
        };
        if chance(rng, blink) {
            self.pose = self.pose.toggle_eyes();
        }
        self.pose
    }

    /// Stop timer fired: clear the intervals and return to the idle pose
    pub fn finish<P>(&mut self, engine: &mut TimerEngine<P>) -> FacePose {
        self.halt(engine);
        self.pose = FacePose::IDLE;
        self.pose
    }

    /// Cancel every timer of this driver, leaving the pose as it is
    pub fn halt<P>(&mut self, engine: &mut TimerEngine<P>) {
        for id in self.timers.ids() {
            engine.cancel(id);
        }
        self.timers = TalkTimers::default();
        self.paused_until = None;
    }

    /// Forget timer handles after the owner's timers were cancelled wholesale
    pub fn detach(&mut self) {
        self.timers = TalkTimers::default();
        self.paused_until = None;
    }

    /// Reset the pose without touching timers
    pub fn reset_pose(&mut self) {
        self.pose = FacePose::IDLE;
    }

    pub fn pose(&self) -> FacePose {
        self.pose
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn is_running(&self) -> bool {
        self.timers.mouth.is_some()
    }

    /// Is a measured-cadence pause holding the mouth closed at `now`?
    pub fn is_paused(&self, now: SceneTime) -> bool {
        self.paused_until.is_some_and(|until| now < until)
    }

    /// Live timer handles (mouth, eye, stop)
    pub fn timer_ids(&self) -> Vec<TimerId> {
        self.timers.ids().collect()
    }
}
