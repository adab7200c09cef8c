//! Engine configuration

use std::time::Duration;

use marionette_core::{MarionetteError, MarionetteResult};
use marionette_visual::{MeasuredConfig, TalkingConfig, WalkingConfig};
use marionette_voice::CueTiming;
use serde::{Deserialize, Serialize};

/// Scene engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Brisk talking cadence
    pub talking: TalkingConfig,
    /// Measured talking cadence, used for long cues
    pub measured: MeasuredConfig,
    pub walking: WalkingConfig,
    /// Cue buffer and cadence threshold
    pub cues: CueTiming,
    /// Fade length when a script does not name one
    #[serde(rename = "disappear_fade_ms", with = "marionette_core::millis")]
    pub disappear_fade: Duration,
    /// Delay between one actor completing and the next one starting
    #[serde(rename = "entrance_delay_ms", with = "marionette_core::millis")]
    pub entrance_delay: Duration,
    /// Delay between consecutive disappear steps of a cascade
    #[serde(rename = "cascade_stagger_ms", with = "marionette_core::millis")]
    pub cascade_stagger: Duration,
    /// Real-time runner tick
    #[serde(rename = "tick_interval_ms", with = "marionette_core::millis")]
    pub tick_interval: Duration,
    /// Largest scene step per runner tick
    #[serde(rename = "max_step_ms", with = "marionette_core::millis")]
    pub max_step: Duration,
    /// Diagnostic events kept in memory
    pub diagnostics_capacity: usize,
    /// RNG seed for blink and pause draws; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            talking: TalkingConfig::default(),
            measured: MeasuredConfig::default(),
            walking: WalkingConfig::default(),
            cues: CueTiming::default(),
            disappear_fade: Duration::from_millis(1000),
            entrance_delay: Duration::from_millis(2000),
            cascade_stagger: Duration::from_millis(500),
            tick_interval: Duration::from_millis(10),
            max_step: Duration::from_millis(100),
            diagnostics_capacity: 4096,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Slower preset for younger audiences: relaxed mouth cadence, longer
    /// handoffs, and a cascade that leaves more room between actors
    pub fn unhurried() -> Self {
        EngineConfig {
            talking: TalkingConfig {
                mouth_period: Duration::from_millis(200),
                eye_period: Duration::from_millis(400),
                ..TalkingConfig::default()
            },
            measured: MeasuredConfig {
                mouth_period: Duration::from_millis(300),
                eye_period: Duration::from_millis(400),
                ..MeasuredConfig::default()
            },
            walking: WalkingConfig {
                leg_period: Duration::from_millis(250),
                ..WalkingConfig::default()
            },
            disappear_fade: Duration::from_millis(1500),
            entrance_delay: Duration::from_millis(2000),
            cascade_stagger: Duration::from_millis(800),
            ..Self::default()
        }
    }

    /// Same configuration with a fixed RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> MarionetteResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MarionetteError::Plan(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A runner tick longer than the step clamp would let the scene fall
    /// behind wall time
    pub fn validate(&self) -> MarionetteResult<()> {
        if self.max_step.is_zero() {
            return Err(MarionetteError::InvalidConfig(
                "max_step must be positive".to_string(),
            ));
        }
        if self.tick_interval > self.max_step {
            return Err(MarionetteError::InvalidConfig(format!(
                "tick interval {}ms exceeds max step {}ms",
                self.tick_interval.as_millis(),
                self.max_step.as_millis()
            )));
        }
        Ok(())
    }
}
