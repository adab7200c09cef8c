//! Shared driver plumbing

use rand::Rng;

/// Timer payloads scheduled by the frame drivers.
/// A scene's own timer payload type embeds these via `From<DriverTimer>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverTimer {
    /// Talking: flip the mouth axis
    MouthTick,
    /// Talking: maybe flip the eye axis
    EyeTick,
    /// Talking: the cue's declared duration elapsed
    TalkStop,
    /// Walking: alternate legs, maybe blink
    LegTick,
}

/// Bernoulli draw tolerant of out-of-range probabilities
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if probability.is_nan() || probability <= 0.0 {
        return false;
    }
    rng.gen_bool(probability.min(1.0))
}
