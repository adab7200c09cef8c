//! Marionette Runtime - Actors, choreography and the scene loop
//!
//! A scene advances in this order on every step:
//! 1. Advance scene time to the next due timer
//! 2. Dispatch the timer to its owner (actor or sequencer)
//! 3. On a stage change, run the cleanup gate before anything else
//! 4. Enter the new stage: set, pose, drivers, audio, tweens
//! 5. Route completion signals through the sequencer
//! 6. Publish signals and the render snapshot to the host

pub mod actor;
pub mod cleanup;
pub mod config;
pub mod diagnostics;
pub mod logging;
pub mod plan;
pub mod runner;
pub mod scene;
pub mod script;
pub mod sequencer;

pub use actor::*;
pub use cleanup::*;
pub use config::*;
pub use diagnostics::*;
pub use plan::*;
pub use runner::*;
pub use scene::*;
pub use script::*;
pub use sequencer::*;
