//! Marionette Test Harness - Simulation and invariant checking
//!
//! This crate provides:
//! - A deterministic scene simulator sampling timer census and frames
//! - Invariant checks over simulated runs
//! - Canned scenes shared by tests and benches
//! - A seeded trigger fuzzer for random interleavings

pub mod fuzzer;
pub mod invariants;
pub mod scenarios;
pub mod simulator;

pub use fuzzer::*;
pub use invariants::*;
pub use simulator::*;
