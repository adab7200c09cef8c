//! Canned scenes
//!
//! Small, seeded scenes reused by the simulator tests, the trigger fuzzer
//! and the benches.

use std::time::Duration;

use marionette_core::{ActorId, AudioCue, MarionetteResult, SceneId, Stage};
use marionette_runtime::{ActorScript, Choreography, EngineConfig, Scene, ScenePlan};
use marionette_visual::{names, ExpressionTable, Point};
use marionette_voice::PlaybackService;

pub const ALEX: ActorId = ActorId(1);
pub const TRIO: [ActorId; 3] = [ActorId(1), ActorId(2), ActorId(3)];

const SEED: u64 = 0x5eed;
const CLASSROOM: &str = include_str!("../../marionette-runtime/plans/classroom.json");

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn config() -> EngineConfig {
    EngineConfig::default().with_seed(SEED)
}

/// Cues named `{prefix}-{i}.mp3` with the given durations
pub fn cues(prefix: &str, durations: &[u64]) -> Vec<AudioCue> {
    durations
        .iter()
        .enumerate()
        .map(|(i, &d)| AudioCue::from_millis(format!("{prefix}-{i}.mp3"), d))
        .collect()
}

/// Talks through `lines` and waits in `Static`
pub fn talker(lines: &[u64]) -> ActorScript {
    ActorScript::builder()
        .speak(Stage::Talking, names::TALKING, cues("line", lines))
        .settle(Stage::Static, names::STATIC)
        .build()
}

/// Appears directly in `Static`
pub fn stander() -> ActorScript {
    ActorScript::builder().settle(Stage::Static, names::STATIC).build()
}

/// One actor: a 1 s hola cue, then a 2.5 s walk, then `Static`
pub fn hola_then_walk() -> MarionetteResult<Scene> {
    let script = ActorScript::builder()
        .speak(Stage::Hola, names::HOLA, cues("hola", &[1000]))
        .travel(Stage::Walking, names::WALKING, Point::new(2.0, 0.0), ms(2500))
        .settle(Stage::Static, names::STATIC)
        .build();
    Scene::builder(SceneId::new(1))
        .config(config())
        .actor(ALEX, "alex", script, ExpressionTable::conventional("alex"))
        .build()
}

/// Three standers with a cascade over [`TRIO`] in order
pub fn cascade_trio(stagger: Duration) -> MarionetteResult<Scene> {
    let mut builder = Scene::builder(SceneId::new(2)).config(config());
    for (i, id) in TRIO.into_iter().enumerate() {
        let name = format!("kid{}", i + 1);
        builder = builder.actor(id, name.clone(), stander(), ExpressionTable::conventional(&name));
    }
    builder
        .choreography(Choreography::default().with_cascade(TRIO.to_vec(), stagger))
        .build()
}

/// Three talkers chained in [`TRIO`] order, first one starting on mount
pub fn talking_chain(lines: &[u64], delays: Vec<Duration>) -> MarionetteResult<Scene> {
    let mut builder = Scene::builder(SceneId::new(3)).config(config());
    for (i, id) in TRIO.into_iter().enumerate() {
        let name = format!("kid{}", i + 1);
        builder = builder.actor(id, name.clone(), talker(lines), ExpressionTable::conventional(&name));
    }
    builder
        .choreography(Choreography::chain(TRIO.to_vec(), delays).with_lead_in(Duration::ZERO))
        .build()
}

/// One presenter with every entrance stage and an encore
pub fn presenter(playback: impl PlaybackService + 'static) -> MarionetteResult<Scene> {
    let script = ActorScript::presenter(
        cues("hola", &[1000]),
        cues("monologue", &[2000, 1500]),
        cues("encore", &[1200]),
        [Point::new(0.0, 0.0), Point::new(0.0, 2.0), Point::new(3.0, 2.0)],
    );
    Scene::builder(SceneId::new(4))
        .config(config())
        .actor(ALEX, "profe", script, ExpressionTable::conventional("profe"))
        .playback(playback)
        .build()
}

/// The bundled classroom plan
pub fn classroom(playback: impl PlaybackService + 'static) -> MarionetteResult<Scene> {
    ScenePlan::from_json(CLASSROOM)?.build(playback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::check_all;
    use crate::simulator::SceneSimulator;
    use marionette_core::{EngineEvent, SceneTime, TriggerKind};
    use marionette_runtime::SceneSignal;
    use marionette_time::TimerCategory;
    use marionette_voice::ScriptedPlayback;

    fn at(millis: u64) -> SceneTime {
        SceneTime::from_millis(millis)
    }

    #[test]
    fn test_hola_cue_hands_over_to_walking() {
        let mut sim = SceneSimulator::new(hola_then_walk().unwrap()).with_step(ms(1));
        sim.pulse(ALEX, TriggerKind::Start).unwrap();

        sim.run_for(ms(1299));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::Hola));
        sim.run_for(ms(1));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::Walking));

        let census = sim.scene().census(ALEX);
        assert_eq!(census.get(TimerCategory::Mouth), 0);
        assert_eq!(census.get(TimerCategory::Eye), 0);
        assert_eq!(census.get(TimerCategory::StageDuration), 0);
        assert_eq!(census.get(TimerCategory::Leg), 1);

        sim.run_for(ms(3000));
        let result = sim.finish();
        assert_eq!(result.entered_at(ALEX, Stage::Walking), Some(at(1300)));
        assert_eq!(result.entered_at(ALEX, Stage::Static), Some(at(3800)));
        check_all(&result).unwrap();
    }

    #[test]
    fn test_cascade_waits_for_every_actor() {
        let mut sim = SceneSimulator::new(cascade_trio(ms(500)).unwrap()).with_step(ms(10));
        for id in TRIO {
            sim.pulse(id, TriggerKind::Start).unwrap();
        }
        sim.cascade().unwrap();
        sim.run_for(ms(1999));
        assert!(!sim.signals().iter().any(|s| matches!(s, SceneSignal::AllGone { .. })));
        sim.run_for(ms(1000));

        let result = sim.finish();
        for (i, id) in TRIO.into_iter().enumerate() {
            assert_eq!(result.entered_at(id, Stage::Disappearing), Some(at(500 * i as u64)));
            assert_eq!(result.entered_at(id, Stage::Done), Some(at(1000 + 500 * i as u64)));
        }
        assert_eq!(result.all_gone_at(), Some(at(2000)));
        check_all(&result).unwrap();
    }

    #[test]
    fn test_chain_starts_each_actor_after_the_previous() {
        let mut sim = SceneSimulator::new(talking_chain(&[600, 900], vec![ms(2000), ms(2000)]).unwrap());
        sim.mount();
        sim.run_for(ms(15_000));

        let result = sim.finish();
        // 600 + 900 + 300 buffer = 1800 per talker
        let starts: Vec<_> = TRIO
            .iter()
            .map(|&id| result.entered_at(id, Stage::Talking))
            .collect();
        assert_eq!(starts, vec![Some(at(0)), Some(at(3800)), Some(at(7600))]);
        assert_eq!(result.entered_at(TRIO[2], Stage::Static), Some(at(9400)));
        check_all(&result).unwrap();
    }

    #[test]
    fn test_presenter_full_lifecycle() {
        let playback = ScriptedPlayback::new();
        let mut sim = SceneSimulator::new(presenter(playback.clone()).unwrap());
        sim.pulse(ALEX, TriggerKind::Start).unwrap();
        sim.run_for(ms(14_000));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::Static));

        assert!(sim.pulse(ALEX, TriggerKind::ContinueTalking).unwrap());
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::ArmUpTalking));
        sim.run_for(ms(2000));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::FinalStatic));

        assert!(!sim.pulse(ALEX, TriggerKind::ContinueTalking).unwrap());
        assert!(sim.pulse(ALEX, TriggerKind::Disappear).unwrap());
        sim.run_for(ms(1500));

        let result = sim.finish();
        assert_eq!(result.stage_of(ALEX), Some(Stage::Done));
        assert_eq!(result.entered_at(ALEX, Stage::Walking), Some(at(1300)));
        assert_eq!(result.entered_at(ALEX, Stage::Talking), Some(at(3800)));
        assert_eq!(result.entered_at(ALEX, Stage::FinalWalking), Some(at(7600)));
        assert_eq!(result.entered_at(ALEX, Stage::SideMoving), Some(at(11_100)));
        assert_eq!(result.entered_at(ALEX, Stage::Static), Some(at(13_100)));
        assert_eq!(
            playback.played(),
            vec!["hola-0.mp3", "monologue-0.mp3", "monologue-1.mp3", "encore-0.mp3"]
        );
        assert!(playback.active().is_empty());
        check_all(&result).unwrap();
    }

    #[test]
    fn test_triggers_outside_their_stage_are_ignored() {
        let mut sim = SceneSimulator::new(presenter(ScriptedPlayback::new()).unwrap());
        assert!(!sim.pulse(ALEX, TriggerKind::Disappear).unwrap());
        assert!(!sim.pulse(ALEX, TriggerKind::ContinueTalking).unwrap());
        assert!(sim.pulse(ALEX, TriggerKind::Start).unwrap());
        sim.run_for(ms(5000));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::Talking));
        assert!(!sim.pulse(ALEX, TriggerKind::Disappear).unwrap());
        assert!(!sim.pulse(ALEX, TriggerKind::Start).unwrap());

        let result = sim.finish();
        assert_eq!(
            result.count_events(|e| matches!(e, EngineEvent::TriggerIgnored { .. })),
            4
        );
        check_all(&result).unwrap();
    }

    #[test]
    fn test_teardown_mid_talking_leaves_nothing_behind() {
        let playback = ScriptedPlayback::new();
        let mut sim = SceneSimulator::new(presenter(playback.clone()).unwrap());
        sim.pulse(ALEX, TriggerKind::Start).unwrap();
        sim.run_for(ms(4500));
        assert_eq!(sim.scene().stage(ALEX), Some(Stage::Talking));

        sim.teardown();
        assert!(sim.scene().engine().queue().is_empty());
        assert!(playback.active().is_empty());
        let signals_before = sim.signals().len();
        sim.run_for(ms(20_000));
        assert_eq!(sim.signals().len(), signals_before);
        check_all(&sim.finish()).unwrap();
    }

    #[test]
    fn test_classroom_plan_runs_to_all_gone() {
        let mut sim = SceneSimulator::new(classroom(ScriptedPlayback::new()).unwrap()).with_step(ms(20));
        sim.mount();
        let entered = sim.run_until(Duration::from_secs(120), |scene| {
            scene.actors().iter().all(|a| a.stage().is_settled())
        });
        assert!(entered);

        assert!(sim.cascade().unwrap());
        let gone = sim.run_until(Duration::from_secs(10), |scene| scene.sequencer().is_all_gone());
        assert!(gone);

        let result = sim.finish();
        assert!(result.final_stages.iter().all(|(_, stage)| *stage == Stage::Done));
        check_all(&result).unwrap();
    }
}
