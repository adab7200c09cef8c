//! Error types for the sequencing engine

use thiserror::Error;

use crate::{ActorId, PoseKind, Stage};

/// Core engine errors
#[derive(Error, Debug)]
pub enum MarionetteError {
    // Stage machine errors
    #[error("Invalid transition for actor {actor}: {from} -> {to}")]
    InvalidTransition { actor: ActorId, from: Stage, to: Stage },

    #[error("Actor not found: {0:?}")]
    UnknownActor(ActorId),

    #[error("Duplicate actor: {0:?}")]
    DuplicateActor(ActorId),

    // Expression errors
    #[error("Unknown expression set: {0}")]
    UnknownExpressionSet(String),

    #[error("Pose mismatch: set {set} holds {expected} frames, got a {actual} pose")]
    PoseMismatch {
        set: String,
        expected: PoseKind,
        actual: PoseKind,
    },

    // Script and plan errors
    #[error("Invalid script for actor {actor}: {reason}")]
    InvalidScript { actor: ActorId, reason: String },

    #[error("Invalid choreography: {0}")]
    InvalidChoreography(String),

    #[error("Invalid plan: {0}")]
    Plan(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Lifecycle errors
    #[error("Scene already torn down")]
    SceneTornDown,

    #[error("Audio session disposed")]
    SessionDisposed,

    #[error("Runner error: {0}")]
    Runner(String),
}

/// Result type for engine operations
pub type MarionetteResult<T> = Result<T, MarionetteError>;
