//! Marionette Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the sequencing engine:
//! - Identifiers (ActorId, SceneId, TimerId)
//! - Scene time
//! - Stages, pose axes and audio cues
//! - Edge-triggered inputs
//! - Diagnostic events and errors

pub mod cue;
pub mod error;
pub mod event;
pub mod id;
pub mod millis;
pub mod pose;
pub mod stage;
pub mod time;
pub mod trigger;

pub use cue::*;
pub use error::*;
pub use event::*;
pub use id::*;
pub use pose::*;
pub use stage::*;
pub use time::*;
pub use trigger::*;
