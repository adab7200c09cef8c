//! Real-time scene runner
//!
//! Moves a [`Scene`] onto a tokio task and advances it from the wall clock
//! on a fixed tick. Hosts talk to it through commands, receive signals over
//! a channel and read the latest snapshot without touching the scene.

use std::sync::Arc;
use std::time::Duration;

use marionette_core::{ActorId, MarionetteError, MarionetteResult, TriggerKind};
use marionette_time::WallClock;
use marionette_voice::PlaybackHandle;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::scene::{Scene, SceneSignal, SceneSnapshot};

const COMMAND_CAPACITY: usize = 64;
const MIN_TICK: Duration = Duration::from_millis(1);

/// Host input to a running scene
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand {
    Mount,
    Trigger {
        actor: ActorId,
        kind: TriggerKind,
        level: bool,
    },
    Cascade(bool),
    Volume(f32),
    MediaEnded(PlaybackHandle),
    /// Tear the scene down and stop the loop
    Teardown,
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("scene runner has stopped")]
    Stopped,

    #[error("scene runner task failed: {0}")]
    Join(String),
}

impl From<RunnerError> for MarionetteError {
    fn from(err: RunnerError) -> Self {
        MarionetteError::Runner(err.to_string())
    }
}

/// Handle to a scene running on a tokio task
pub struct SceneRunner {
    commands: mpsc::Sender<SceneCommand>,
    snapshot: Arc<RwLock<SceneSnapshot>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Scene>,
}

impl SceneRunner {
    /// Spawn the scene loop. Must be called from within a tokio runtime.
    pub fn spawn(scene: Scene, signals: mpsc::UnboundedSender<SceneSignal>) -> Self {
        let (commands, inbox) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown, stop) = oneshot::channel();
        let snapshot = Arc::new(RwLock::new(scene.snapshot()));

        let task = tokio::spawn(run(scene, inbox, stop, signals, Arc::clone(&snapshot)));

        SceneRunner {
            commands,
            snapshot,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub async fn send(&self, command: SceneCommand) -> MarionetteResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RunnerError::Stopped.into())
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SceneSnapshot {
        self.snapshot.read().clone()
    }

    pub fn snapshot_handle(&self) -> Arc<RwLock<SceneSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and hand the scene back
    pub async fn shutdown(mut self) -> MarionetteResult<Scene> {
        if let Some(shutdown) = self.shutdown.take() {
            // The loop may already have stopped on its own
            let _ = shutdown.send(());
        }
        self.task
            .await
            .map_err(|e| RunnerError::Join(e.to_string()).into())
    }
}

async fn run(
    mut scene: Scene,
    mut inbox: mpsc::Receiver<SceneCommand>,
    mut stop: oneshot::Receiver<()>,
    signals: mpsc::UnboundedSender<SceneSignal>,
    snapshot: Arc<RwLock<SceneSnapshot>>,
) -> Scene {
    let tick = scene.config().tick_interval.max(MIN_TICK);
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = WallClock::with_max_step(Instant::now().into_std(), scene.config().max_step);

    info!(scene = %scene.id(), tick_ms = tick.as_millis() as u64, "scene runner started");

    loop {
        tokio::select! {
            _ = &mut stop => break,
            command = inbox.recv() => {
                let Some(command) = command else { break };
                let done = apply(&mut scene, command);
                publish(&mut scene, &signals, &snapshot);
                if done {
                    break;
                }
            }
            now = ticker.tick() => {
                let dt = clock.tick_at(now.into_std());
                scene.advance(dt);
                publish(&mut scene, &signals, &snapshot);
            }
        }
    }

    info!(scene = %scene.id(), at_ms = scene.now().as_millis(), "scene runner stopped");
    scene
}

/// Apply one command; returns true when the loop should stop
fn apply(scene: &mut Scene, command: SceneCommand) -> bool {
    debug!(scene = %scene.id(), command = ?command, "command");
    let result = match command {
        SceneCommand::Mount => scene.mount(),
        SceneCommand::Trigger { actor, kind, level } => {
            scene.set_trigger(actor, kind, level).map(|_| ())
        }
        SceneCommand::Cascade(level) => scene.trigger_cascade(level).map(|_| ()),
        SceneCommand::Volume(volume) => scene.set_volume(volume).map(|_| ()),
        SceneCommand::MediaEnded(handle) => {
            scene.media_ended(handle);
            Ok(())
        }
        SceneCommand::Teardown => {
            scene.teardown();
            return true;
        }
    };
    if let Err(err) = result {
        warn!(scene = %scene.id(), error = %err, "command rejected");
    }
    false
}

fn publish(
    scene: &mut Scene,
    signals: &mpsc::UnboundedSender<SceneSignal>,
    snapshot: &RwLock<SceneSnapshot>,
) {
    for signal in scene.drain_signals() {
        if signals.send(signal).is_err() {
            debug!(scene = %scene.id(), "signal receiver dropped");
        }
    }
    *snapshot.write() = scene.snapshot();
}
