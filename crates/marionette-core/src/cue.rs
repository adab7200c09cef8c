//! Audio cues
//!
//! A cue pairs an audio reference with the duration the animation is timed
//! against. The declared duration is authoritative; media "ended" events are
//! advisory only.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One audio clip of a scripted monologue
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioCue {
    /// Opaque reference handed to the playback service
    pub reference: String,
    /// Expected playback duration
    #[serde(rename = "expected_duration_ms", with = "crate::millis")]
    pub expected_duration: Duration,
}

impl AudioCue {
    pub fn new(reference: impl Into<String>, expected_duration: Duration) -> Self {
        AudioCue {
            reference: reference.into(),
            expected_duration,
        }
    }

    pub fn from_millis(reference: impl Into<String>, millis: u64) -> Self {
        Self::new(reference, Duration::from_millis(millis))
    }
}

/// Total declared duration of a cue list
pub fn total_duration(cues: &[AudioCue]) -> Duration {
    cues.iter().map(|c| c.expected_duration).sum()
}

/// Longest declared cue of a list
pub fn longest(cues: &[AudioCue]) -> Option<&AudioCue> {
    cues.iter().max_by_key(|c| c.expected_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_json_shape() {
        let cue: AudioCue =
            serde_json::from_str(r#"{"reference":"a.mp3","expected_duration_ms":1000}"#).unwrap();
        assert_eq!(cue, AudioCue::from_millis("a.mp3", 1000));
    }

    #[test]
    fn test_totals() {
        let cues = vec![
            AudioCue::from_millis("intro.mp3", 1200),
            AudioCue::from_millis("body.mp3", 9000),
            AudioCue::from_millis("outro.mp3", 800),
        ];
        assert_eq!(total_duration(&cues), Duration::from_millis(11_000));
        assert_eq!(longest(&cues).map(|c| c.reference.as_str()), Some("body.mp3"));
        assert!(longest(&[]).is_none());
    }
}
