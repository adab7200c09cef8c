//! Audio errors

use thiserror::Error;

/// Playback service failures. Never fatal to a sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The media element refused to start (autoplay policy, decode error, ...)
    #[error("Playback rejected: {0}")]
    Rejected(String),

    #[error("Playback unavailable")]
    Unavailable,

    #[error("Audio session disposed")]
    SessionDisposed,
}

/// Audio session failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Audio session disposed")]
    Disposed,
}

impl From<AudioError> for PlaybackError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Disposed => PlaybackError::SessionDisposed,
        }
    }
}

impl From<AudioError> for marionette_core::MarionetteError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Disposed => marionette_core::MarionetteError::SessionDisposed,
        }
    }
}
