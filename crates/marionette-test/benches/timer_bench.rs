//! Benchmarks for the scene timer queue

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use marionette_core::{ActorId, SceneTime};
use marionette_time::{TimerCategory, TimerEngine, TimerOwner};

fn loaded_engine(actors: u64) -> TimerEngine<u32> {
    let mut engine = TimerEngine::new();
    for id in 0..actors {
        let owner = TimerOwner::Actor(ActorId::new(id));
        engine.every(owner, TimerCategory::Mouth, Duration::from_millis(150), 0);
        engine.every(owner, TimerCategory::Eye, Duration::from_millis(350), 1);
        engine.after(owner, TimerCategory::StageDuration, Duration::from_millis(1300), 2);
    }
    engine
}

fn bench_schedule_cancel(c: &mut Criterion) {
    let mut engine: TimerEngine<u32> = TimerEngine::new();
    let owner = TimerOwner::Actor(ActorId::new(1));

    c.bench_function("timer_schedule_cancel", |b| {
        b.iter(|| {
            let id = engine.after(owner, TimerCategory::Animation, Duration::from_millis(10), 0);
            black_box(engine.cancel(id))
        })
    });
}

fn bench_pop_until(c: &mut Criterion) {
    c.bench_function("timer_pop_until_1s_32_actors", |b| {
        b.iter_batched(
            || loaded_engine(32),
            |mut engine| {
                let mut fired = 0;
                while engine.pop_until(SceneTime::from_millis(1000)).is_some() {
                    fired += 1;
                }
                black_box(fired)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_cancel_owner(c: &mut Criterion) {
    c.bench_function("timer_cancel_owner_32_actors", |b| {
        b.iter_batched(
            || loaded_engine(32),
            |mut engine| black_box(engine.cancel_owner(TimerOwner::Actor(ActorId::new(16)))),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_schedule_cancel, bench_pop_until, bench_cancel_owner);
criterion_main!(benches);
