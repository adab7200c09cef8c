//! Marionette Time - Scene clock and timer queue
//!
//! This crate stands in for the host event loop's timer primitives:
//! - Scene clock: virtual, monotonic, advanced by the host
//! - Wall clock: converts host instants into clamped steps
//! - Timer queue: one-shot and repeating timers attributed to an owner
//! - Timer engine: drains due timers in order while moving the clock

pub mod clock;
pub mod engine;
pub mod timer;

pub use clock::*;
pub use engine::*;
pub use timer::*;
