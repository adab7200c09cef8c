//! Per-scene audio session
//!
//! Every actor of a scene plays through one shared gain stage so that a
//! single volume control affects them all. The session is created once per
//! scene, handed to the scene explicitly, and disposed on teardown.

use marionette_core::SceneId;

use crate::AudioError;

/// Shared gain stage feeding the output
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainStage {
    /// Creation serial, stable for the session's lifetime
    pub serial: u32,
    /// Linear gain in [0, 1]
    pub level: f32,
}

/// Audio session of one scene
#[derive(Debug)]
pub struct AudioSession {
    scene: SceneId,
    volume: f32,
    gain: Option<GainStage>,
    gains_created: u32,
    disposed: bool,
}

impl AudioSession {
    pub fn new(scene: SceneId) -> Self {
        Self::with_volume(scene, 1.0)
    }

    pub fn with_volume(scene: SceneId, volume: f32) -> Self {
        AudioSession {
            scene,
            volume: clamp_volume(volume, 1.0),
            gain: None,
            gains_created: 0,
            disposed: false,
        }
    }

    /// The shared gain stage, created on first use and reused afterwards
    pub fn gain_stage(&mut self) -> Result<GainStage, AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        let volume = self.volume;
        let created = &mut self.gains_created;
        let gain = self.gain.get_or_insert_with(|| {
            *created += 1;
            GainStage {
                serial: *created,
                level: volume,
            }
        });
        Ok(*gain)
    }

    /// Set the volume for every actor. Last writer wins; the value is
    /// clamped into [0, 1] and NaN keeps the previous level.
    pub fn set_volume(&mut self, volume: f32) -> Result<f32, AudioError> {
        if self.disposed {
            return Err(AudioError::Disposed);
        }
        self.volume = clamp_volume(volume, self.volume);
        if let Some(gain) = self.gain.as_mut() {
            gain.level = self.volume;
        }
        Ok(self.volume)
    }

    /// The gain stage if it was already created
    pub fn current_gain(&self) -> Option<GainStage> {
        self.gain
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// How many gain stages this session ever created (at most one)
    pub fn gains_created(&self) -> u32 {
        self.gains_created
    }

    /// End the session. Idempotent.
    pub fn dispose(&mut self) {
        if !self.disposed {
            tracing::debug!(scene = %self.scene, "audio session disposed");
        }
        self.disposed = true;
        self.gain = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn clamp_volume(volume: f32, fallback: f32) -> f32 {
    if volume.is_nan() {
        fallback
    } else {
        volume.clamp(0.0, 1.0)
    }
}
