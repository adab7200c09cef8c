//! Run a scene plan in real time and log what happens.
//!
//! Usage: marionette-demo [--json] <plan.json> [duration]
//!
//! Once every actor has finished its entrance, actors with a continuation
//! are asked to continue; once those settle too, the disappearance cascade
//! is triggered. The run ends on "all gone" or when `duration` (default
//! `2m`, humantime syntax) runs out.

use std::collections::HashSet;
use std::time::Duration;

use marionette_core::{ActorId, MarionetteError, MarionetteResult, TriggerKind};
use marionette_runtime::logging::init_tracing;
use marionette_runtime::{SceneCommand, ScenePlan, SceneRunner, SceneSignal, ScriptPart};
use marionette_voice::NullPlayback;
use tokio::sync::mpsc;
use tracing::{info, warn};

const DEFAULT_DURATION: &str = "2m";

struct Args {
    plan: String,
    duration: Duration,
    json: bool,
}

fn parse_args() -> MarionetteResult<Args> {
    let mut json = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let plan = positional.next().ok_or_else(|| {
        MarionetteError::Runner("usage: marionette-demo [--json] <plan.json> [duration]".to_string())
    })?;
    let duration = positional.next().unwrap_or_else(|| DEFAULT_DURATION.to_string());
    let duration = humantime::parse_duration(&duration)
        .map_err(|e| MarionetteError::Runner(format!("bad duration {duration:?}: {e}")))?;

    Ok(Args {
        plan,
        duration,
        json,
    })
}

#[tokio::main]
async fn main() -> MarionetteResult<()> {
    let args = parse_args()?;
    init_tracing("info", args.json)?;

    let plan = ScenePlan::load(&args.plan)?;
    let everyone: HashSet<ActorId> = plan.actor_ids().collect();
    let with_continuation: HashSet<ActorId> = plan
        .actors
        .iter()
        .filter(|a| !a.script.continuation.is_empty())
        .map(|a| a.id)
        .collect();
    let self_starting = plan.choreography.lead_in.is_some();
    let scene = plan.build(NullPlayback::new())?;

    info!(
        plan = %args.plan,
        actors = everyone.len(),
        limit = %humantime::format_duration(args.duration),
        "running scene"
    );

    let (tx, mut signals) = mpsc::unbounded_channel();
    let runner = SceneRunner::spawn(scene, tx);
    runner.send(SceneCommand::Mount).await?;
    if !self_starting {
        // No lead-in: start everyone not waiting on an entrance link
        let chained: HashSet<ActorId> = plan.choreography.entrance.iter().skip(1).copied().collect();
        for &actor in everyone.difference(&chained) {
            runner.send(start(actor)).await?;
        }
    }

    let mut entered = HashSet::new();
    let mut encores = HashSet::new();
    let deadline = tokio::time::sleep(args.duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                warn!("time limit reached before all actors were gone");
                break;
            }
            signal = signals.recv() => {
                let Some(signal) = signal else { break };
                info!(signal = ?signal, "scene signal");
                match signal {
                    SceneSignal::Completed { actor, part: ScriptPart::Entrance, .. } => {
                        entered.insert(actor);
                        if entered == everyone {
                            if with_continuation.is_empty() {
                                runner.send(SceneCommand::Cascade(true)).await?;
                            }
                            for &actor in &with_continuation {
                                runner.send(SceneCommand::Trigger {
                                    actor,
                                    kind: TriggerKind::ContinueTalking,
                                    level: true,
                                }).await?;
                            }
                        }
                    }
                    SceneSignal::Completed { actor, part: ScriptPart::Continuation, .. } => {
                        encores.insert(actor);
                        if encores == with_continuation {
                            runner.send(SceneCommand::Cascade(true)).await?;
                        }
                    }
                    SceneSignal::DisappearComplete { .. } => {}
                    SceneSignal::AllGone { .. } => break,
                }
            }
        }
    }

    let snapshot = runner.snapshot();
    let scene = runner.shutdown().await?;
    info!(
        at_ms = snapshot.at_ms,
        timers_fired = scene.stats().timers_fired,
        signals = scene.stats().signals_emitted,
        diagnostics = scene.diagnostics().len(),
        "scene finished"
    );
    Ok(())
}

fn start(actor: ActorId) -> SceneCommand {
    SceneCommand::Trigger {
        actor,
        kind: TriggerKind::Start,
        level: true,
    }
}
