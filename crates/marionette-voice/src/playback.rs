//! Playback service seam
//!
//! The media layer is external. The engine asks it to play a cue through the
//! scene's gain stage and stops in-flight handles on cleanup. A rejected
//! `play` is logged by the caller and the cue's declared duration still
//! drives the animation.

use std::collections::HashSet;
use std::sync::Arc;

use marionette_core::AudioCue;
use parking_lot::Mutex;

use crate::{GainStage, PlaybackError};

/// Handle of one in-flight playback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackHandle(pub u64);

/// External media playback
pub trait PlaybackService: Send {
    /// Start playing `cue`. Ending is reported separately (and only advisorily).
    fn play(&mut self, cue: &AudioCue, gain: &GainStage) -> Result<PlaybackHandle, PlaybackError>;

    /// Stop an in-flight playback. Unknown handles are ignored.
    fn stop(&mut self, handle: PlaybackHandle);

    /// The shared gain stage changed level
    fn apply_gain(&mut self, _gain: &GainStage) {}
}

/// Accepts every cue and plays nothing
#[derive(Debug, Default)]
pub struct NullPlayback {
    next: u64,
}

impl NullPlayback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackService for NullPlayback {
    fn play(&mut self, _cue: &AudioCue, _gain: &GainStage) -> Result<PlaybackHandle, PlaybackError> {
        self.next += 1;
        Ok(PlaybackHandle(self.next))
    }

    fn stop(&mut self, _handle: PlaybackHandle) {}
}

/// Which cues a scripted service rejects
#[derive(Clone, Debug, Default)]
pub enum Rejections {
    #[default]
    None,
    All,
    References(HashSet<String>),
}

impl Rejections {
    fn rejects(&self, cue: &AudioCue) -> bool {
        match self {
            Rejections::None => false,
            Rejections::All => true,
            Rejections::References(refs) => refs.contains(&cue.reference),
        }
    }
}

/// One accepted `play` call
#[derive(Clone, Debug, PartialEq)]
pub struct PlayRecord {
    pub reference: String,
    pub handle: PlaybackHandle,
    pub level: f32,
}

#[derive(Debug, Default)]
struct PlaybackLog {
    rejections: Rejections,
    played: Vec<PlayRecord>,
    rejected: Vec<String>,
    stopped: Vec<PlaybackHandle>,
    gain_level: Option<f32>,
    next: u64,
}

/// Recording playback service. Clones share the same log, so a test can keep
/// one clone while the scene owns the other.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPlayback {
    log: Arc<Mutex<PlaybackLog>>,
}

impl ScriptedPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service whose media never starts (autoplay blocked)
    pub fn rejecting_all() -> Self {
        Self::with_rejections(Rejections::All)
    }

    /// Service that rejects the listed references
    pub fn rejecting<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rejections(Rejections::References(
            references.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_rejections(rejections: Rejections) -> Self {
        let playback = Self::default();
        playback.log.lock().rejections = rejections;
        playback
    }

    /// References of accepted cues, in call order
    pub fn played(&self) -> Vec<String> {
        self.log.lock().played.iter().map(|r| r.reference.clone()).collect()
    }

    pub fn records(&self) -> Vec<PlayRecord> {
        self.log.lock().played.clone()
    }

    /// References of rejected cues, in call order
    pub fn rejected(&self) -> Vec<String> {
        self.log.lock().rejected.clone()
    }

    pub fn stopped(&self) -> Vec<PlaybackHandle> {
        self.log.lock().stopped.clone()
    }

    /// Accepted handles not yet stopped
    pub fn active(&self) -> Vec<PlaybackHandle> {
        let log = self.log.lock();
        log.played
            .iter()
            .map(|r| r.handle)
            .filter(|h| !log.stopped.contains(h))
            .collect()
    }

    /// Last level pushed through `apply_gain`
    pub fn gain_level(&self) -> Option<f32> {
        self.log.lock().gain_level
    }
}

impl PlaybackService for ScriptedPlayback {
    fn play(&mut self, cue: &AudioCue, gain: &GainStage) -> Result<PlaybackHandle, PlaybackError> {
        let mut log = self.log.lock();
        if log.rejections.rejects(cue) {
            log.rejected.push(cue.reference.clone());
            return Err(PlaybackError::Rejected(format!(
                "autoplay blocked for {}",
                cue.reference
            )));
        }
        log.next += 1;
        let handle = PlaybackHandle(log.next);
        log.played.push(PlayRecord {
            reference: cue.reference.clone(),
            handle,
            level: gain.level,
        });
        Ok(handle)
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        let mut log = self.log.lock();
        if !log.stopped.contains(&handle) {
            log.stopped.push(handle);
        }
    }

    fn apply_gain(&mut self, gain: &GainStage) {
        self.log.lock().gain_level = Some(gain.level);
    }
}
