use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sinesth::audio::queue::NoteTrigger;
use sinesth::sequencer::collision::{collides, find_free_lane};
use sinesth::{
    AudioError, Clip, ClipSpan, FrequencyBand, Instrument, MathEvaluator, PlaybackScheduler,
    TimelineStore, Voice, VoiceBank, VoiceLoader, create_trigger_channel,
};

struct NullVoice;

impl Voice for NullVoice {
    fn play(&mut self, trigger: &NoteTrigger) {
        black_box(trigger);
    }
}

struct NullLoader;

impl VoiceLoader for NullLoader {
    fn load_voice(&mut self, _voice_name: &str) -> Result<Box<dyn Voice>, AudioError> {
        Ok(Box::new(NullVoice))
    }
}

/// Clips stacked densely: every beat range is covered in lanes 0..lanes
fn stacked_clips(count: u32, lanes: u32) -> Vec<Clip> {
    (0..count)
        .map(|i| {
            Clip::new(
                format!("c{}", i),
                ClipSpan::new((i / lanes) * 4, 4, i % lanes),
                "Bench",
                "#3b82f6",
            )
        })
        .collect()
}

/// Benchmark the collision check (runs on every drag move)
fn bench_collides(c: &mut Criterion) {
    let mut group = c.benchmark_group("collides");

    for count in [16u32, 128, 1024] {
        let clips = stacked_clips(count, 4);
        let candidate = ClipSpan::new(2, 4, 3);

        group.bench_with_input(BenchmarkId::from_parameter(count), &clips, |b, clips| {
            b.iter(|| black_box(collides(black_box(&candidate), clips, Some("c0"))));
        });
    }
    group.finish();
}

/// Benchmark free-lane search when low lanes are all taken
fn bench_find_free_lane(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_free_lane");

    for lanes in [4u32, 16, 64] {
        let clips = stacked_clips(lanes * 8, lanes);

        group.bench_with_input(BenchmarkId::from_parameter(lanes), &clips, |b, clips| {
            b.iter(|| black_box(find_free_lane(clips, black_box(0), 4, 100)));
        });
    }
    group.finish();
}

/// Benchmark one playback tick over a busy arrangement
fn bench_tick(c: &mut Criterion) {
    let mut store = TimelineStore::default();
    for i in 0..8 {
        let id = format!("inst{}", i);
        store
            .add_instrument(Instrument::new(id.clone(), "flute", "(sin(x/30)*500) + x^2/100", 3.0))
            .unwrap();
        for start in (0..64).step_by(4) {
            store.add_clip(&id, start).unwrap();
            store.add_clip(&id, start + 2).unwrap();
        }
    }

    let (tx, rx) = create_trigger_channel(1024);
    let mut voices = VoiceBank::new(Box::new(NullLoader), rx);
    let mut scheduler =
        PlaybackScheduler::new(tx, Box::new(MathEvaluator::new()), FrequencyBand::AUDIBLE);
    scheduler.start(&mut store, &mut voices).unwrap();

    c.bench_function("tick_8_instruments", |b| {
        b.iter(|| {
            let report = scheduler.tick(&mut store, &voices);
            voices.drain();
            black_box(report)
        });
    });
}

criterion_group!(benches, bench_collides, bench_find_free_lane, bench_tick);
criterion_main!(benches);
