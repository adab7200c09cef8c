//! Cleanup gate
//!
//! Runs at the start of every stage transition and on teardown. Clears every
//! timer attributed to an actor regardless of category and releases its
//! in-flight playback handles. Safe to run when nothing is live.

use marionette_time::{CategoryCounts, TimerEngine, TimerOwner};
use marionette_voice::{PlaybackHandle, PlaybackService};

/// What one gate run released
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub timers: CategoryCounts,
    pub audio_released: usize,
}

impl CleanupReport {
    /// True when there was nothing to clear
    pub fn is_noop(&self) -> bool {
        self.timers.is_empty() && self.audio_released == 0
    }
}

/// Cleanup gate
pub struct CleanupGate;

impl CleanupGate {
    /// Cancel all of `owner`'s timers and stop every handle in `in_flight`
    pub fn run<T>(
        engine: &mut TimerEngine<T>,
        owner: TimerOwner,
        playback: &mut dyn PlaybackService,
        in_flight: &mut Vec<PlaybackHandle>,
    ) -> CleanupReport {
        let timers = engine.cancel_owner(owner);
        let audio_released = in_flight.len();
        for handle in in_flight.drain(..) {
            playback.stop(handle);
        }

        debug_assert_eq!(engine.pending_for(owner), 0);
        CleanupReport {
            timers,
            audio_released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::ActorId;
    use marionette_time::TimerCategory;
    use marionette_voice::ScriptedPlayback;
    use std::time::Duration;

    const ALEX: TimerOwner = TimerOwner::Actor(ActorId(1));
    const CRIS: TimerOwner = TimerOwner::Actor(ActorId(2));

    #[test]
    fn test_clears_every_category() {
        let mut engine = TimerEngine::new();
        let ms = Duration::from_millis;
        engine.every(ALEX, TimerCategory::Mouth, ms(150), 'm');
        engine.every(ALEX, TimerCategory::Eye, ms(350), 'e');
        engine.every(ALEX, TimerCategory::Leg, ms(200), 'l');
        engine.after(ALEX, TimerCategory::StageDuration, ms(1300), 's');
        engine.after(ALEX, TimerCategory::Animation, ms(2500), 'a');
        engine.every(CRIS, TimerCategory::Mouth, ms(150), 'm');

        let mut playback = ScriptedPlayback::new();
        let mut in_flight = vec![PlaybackHandle(4), PlaybackHandle(5)];
        let report = CleanupGate::run(&mut engine, ALEX, &mut playback, &mut in_flight);

        assert_eq!(report.timers.total(), 5);
        assert_eq!(report.timers.get(TimerCategory::Leg), 1);
        assert_eq!(report.audio_released, 2);
        assert!(in_flight.is_empty());
        assert_eq!(playback.stopped(), vec![PlaybackHandle(4), PlaybackHandle(5)]);
        assert_eq!(engine.pending_for(ALEX), 0);
        assert_eq!(engine.pending_for(CRIS), 1);
    }

    #[test]
    fn test_noop_when_idle() {
        let mut engine: TimerEngine<()> = TimerEngine::new();
        let mut playback = ScriptedPlayback::new();
        let report = CleanupGate::run(&mut engine, ALEX, &mut playback, &mut Vec::new());
        assert!(report.is_noop());

        let again = CleanupGate::run(&mut engine, ALEX, &mut playback, &mut Vec::new());
        assert_eq!(report, again);
    }
}
