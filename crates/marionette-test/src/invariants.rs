//! Invariant checks over a simulated run
//!
//! Each check inspects the diagnostics and signals of a finished run (or a
//! live actor) and reports the first violation it finds.

use std::collections::{HashMap, HashSet};

use marionette_core::{ActorId, EngineEvent, SceneTime, Stage};
use marionette_runtime::{Actor, SceneSignal};
use marionette_time::TimerCategory;
use marionette_visual::FrameRef;
use thiserror::Error;

use crate::simulator::SimulationResult;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("actor {actor} held {count} {category} timers at {at:?}")]
    TimerOverlap {
        actor: ActorId,
        category: TimerCategory,
        count: usize,
        at: SceneTime,
    },

    #[error("actor {actor} entered {stage} with {pending} timers still pending")]
    CleanupSkipped {
        actor: ActorId,
        stage: Stage,
        pending: usize,
    },

    #[error("actor {actor} moved {from} -> {to}")]
    IllegalTransition { actor: ActorId, from: Stage, to: Stage },

    #[error("actor {actor} showed frame {frame:?} outside set {set}")]
    ForeignFrame {
        actor: ActorId,
        set: String,
        frame: FrameRef,
    },

    #[error("actor {actor} was active after reaching done")]
    ActiveAfterDone { actor: ActorId },

    #[error("all gone reported {0} times")]
    RepeatedAllGone(usize),

    #[error("all gone reported before actor {0} finished disappearing")]
    PrematureAllGone(ActorId),

    #[error("signal at {later:?} precedes one at {earlier:?}")]
    SignalsOutOfOrder { earlier: SceneTime, later: SceneTime },
}

pub type InvariantResult = Result<(), InvariantViolation>;

/// The current frame of a live actor belongs to its active set
pub fn frame_in_set(actor: &Actor) -> InvariantResult {
    let Some(frame) = actor.frame() else {
        return Ok(());
    };
    let inside = actor
        .expressions()
        .get(actor.set())
        .map(|set| set.contains(frame))
        .unwrap_or(false);
    if inside {
        Ok(())
    } else {
        Err(InvariantViolation::ForeignFrame {
            actor: actor.id(),
            set: actor.set().to_string(),
            frame: frame.clone(),
        })
    }
}

/// No actor ever held more than one timer of a category
pub fn single_timer_per_category(result: &SimulationResult) -> InvariantResult {
    for (&(actor, category), &(count, at)) in &result.census_max {
        if count > 1 {
            return Err(InvariantViolation::TimerOverlap {
                actor,
                category,
                count,
                at,
            });
        }
    }
    Ok(())
}

/// Every stage was entered with nothing left pending from the previous one
pub fn cleanup_before_entry(events: &[EngineEvent]) -> InvariantResult {
    for event in events {
        if let EngineEvent::StageChanged {
            actor,
            to,
            pending_after_cleanup,
            ..
        } = event
        {
            if *pending_after_cleanup != 0 {
                return Err(InvariantViolation::CleanupSkipped {
                    actor: *actor,
                    stage: *to,
                    pending: *pending_after_cleanup,
                });
            }
        }
    }
    Ok(())
}

/// Every recorded transition is one the stage machine permits
pub fn transitions_legal(events: &[EngineEvent]) -> InvariantResult {
    for event in events {
        if let EngineEvent::StageChanged { actor, from, to, .. } = event {
            if !Stage::permits(*from, *to) {
                return Err(InvariantViolation::IllegalTransition {
                    actor: *actor,
                    from: *from,
                    to: *to,
                });
            }
        }
    }
    Ok(())
}

/// Nothing starts for an actor once it is done
pub fn quiet_after_done(events: &[EngineEvent]) -> InvariantResult {
    let mut done = HashSet::new();
    for event in events {
        match event {
            EngineEvent::StageChanged { actor, .. } | EngineEvent::DriverStarted { actor, .. }
                if done.contains(actor) =>
            {
                return Err(InvariantViolation::ActiveAfterDone { actor: *actor });
            }
            EngineEvent::StageChanged {
                actor,
                to: Stage::Done,
                ..
            } => {
                done.insert(*actor);
            }
            _ => {}
        }
    }
    Ok(())
}

/// All gone is reported at most once, after every cascade actor disappeared
pub fn all_gone_last(signals: &[SceneSignal], cascade: &[ActorId]) -> InvariantResult {
    let mut finished: HashMap<ActorId, SceneTime> = HashMap::new();
    let mut reported = 0;
    for signal in signals {
        match signal {
            SceneSignal::DisappearComplete { actor, at } => {
                finished.insert(*actor, *at);
            }
            SceneSignal::AllGone { .. } => {
                reported += 1;
                if let Some(missing) = cascade.iter().find(|a| !finished.contains_key(a)) {
                    return Err(InvariantViolation::PrematureAllGone(*missing));
                }
            }
            SceneSignal::Completed { .. } => {}
        }
    }
    if reported > 1 {
        return Err(InvariantViolation::RepeatedAllGone(reported));
    }
    Ok(())
}

/// Signals come out in scene-time order
pub fn signals_ordered(signals: &[SceneSignal]) -> InvariantResult {
    for pair in signals.windows(2) {
        let (earlier, later) = (pair[0].at(), pair[1].at());
        if later < earlier {
            return Err(InvariantViolation::SignalsOutOfOrder { earlier, later });
        }
    }
    Ok(())
}

/// Run every check on a finished simulation
pub fn check_all(result: &SimulationResult) -> InvariantResult {
    if let Some(violation) = result.violations.first() {
        return Err(violation.clone());
    }
    single_timer_per_category(result)?;
    cleanup_before_entry(&result.events)?;
    transitions_legal(&result.events)?;
    quiet_after_done(&result.events)?;
    all_gone_last(&result.signals, &result.cascade)?;
    signals_ordered(&result.signals)
}
