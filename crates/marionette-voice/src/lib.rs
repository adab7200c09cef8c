//! Marionette Voice - Audio cues as timing, not samples
//!
//! The engine never waits on media. A cue's declared duration drives the
//! animation; the playback service is a best-effort side channel whose
//! failures are logged and otherwise ignored.
//!
//! - Cue cursor and timing policy
//! - Audio session: one shared gain stage per scene with an explicit lifecycle
//! - Playback service seam

pub mod cue;
pub mod error;
pub mod playback;
pub mod session;

pub use cue::*;
pub use error::*;
pub use playback::*;
pub use session::*;
