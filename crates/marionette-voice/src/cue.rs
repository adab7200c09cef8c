//! Cue cursor and timing policy

use std::time::Duration;

use marionette_core::AudioCue;
use marionette_visual::Cadence;
use serde::{Deserialize, Serialize};

/// How a cue's declared duration turns into driver timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueTiming {
    /// Added to the stop timer of the last cue of a phase
    #[serde(rename = "final_cue_buffer_ms", with = "marionette_core::millis")]
    pub final_cue_buffer: Duration,
    /// Cues at least this long use the measured cadence
    #[serde(rename = "measured_threshold_ms", with = "marionette_core::millis")]
    pub measured_threshold: Duration,
}

impl Default for CueTiming {
    fn default() -> Self {
        CueTiming {
            final_cue_buffer: Duration::from_millis(300),
            measured_threshold: Duration::from_millis(8000),
        }
    }
}

impl CueTiming {
    /// Delay of the stop timer for a cue
    pub fn stop_after(&self, cue: &AudioCue, is_last: bool) -> Duration {
        if is_last {
            cue.expected_duration + self.final_cue_buffer
        } else {
            cue.expected_duration
        }
    }

    /// Driver cadence for a cue
    pub fn cadence(&self, cue: &AudioCue) -> Cadence {
        if cue.expected_duration >= self.measured_threshold {
            Cadence::Measured
        } else {
            Cadence::Brisk
        }
    }
}

/// Position within one phase's cue list
#[derive(Clone, Debug)]
pub struct CueCursor {
    cues: Vec<AudioCue>,
    index: usize,
}

impl CueCursor {
    pub fn new(cues: Vec<AudioCue>) -> Self {
        CueCursor { cues, index: 0 }
    }

    /// Cue being played, `None` once the list is exhausted
    pub fn current(&self) -> Option<&AudioCue> {
        self.cues.get(self.index)
    }

    /// Move to the next cue. Returns it, or `None` when all cues were played.
    pub fn advance(&mut self) -> Option<&AudioCue> {
        if self.index < self.cues.len() {
            self.index += 1;
        }
        self.current()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.cues.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.cues.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Declared time left, counting the current cue in full
    pub fn remaining(&self) -> Duration {
        self.cues[self.index.min(self.cues.len())..]
            .iter()
            .map(|c| c.expected_duration)
            .sum()
    }
}
