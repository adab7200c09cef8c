//! Marionette Visual - Frames as state, not pixels
//!
//! Nothing here draws. An actor's visible frame is a pure function of its
//! active expression set and its pose axes; the renderer only ever receives
//! a [`FrameRef`].
//!
//! # Drivers
//!
//! - Talking (brisk): mouth toggles on a fixed cadence, eyes blink at random
//! - Talking (measured): slower mouth with occasional speech pauses
//! - Walking: legs alternate, eyes blink at random
//!
//! Every driver owns at most one timer per category and cancels its previous
//! timers before starting again.

pub mod driver;
pub mod expression;
pub mod talking;
pub mod tween;
pub mod walking;

pub use driver::*;
pub use expression::*;
pub use talking::*;
pub use tween::*;
pub use walking::*;
