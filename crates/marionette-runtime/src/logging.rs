//! Tracing subscriber setup for binaries and long-running hosts

use marionette_core::{MarionetteError, MarionetteResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber. `RUST_LOG` overrides `default_filter`.
/// Fails if a global subscriber is already set.
pub fn init_tracing(default_filter: &str, json: bool) -> MarionetteResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| MarionetteError::Runner(format!("bad log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    result.map_err(|e| MarionetteError::Runner(format!("tracing already initialised: {e}")))
}
