//! Render throughput benchmarks for the engine.
//!
//! Run with: cargo bench -p pb-engine
//!
//! At 44.1kHz a 512-sample block must finish in under 11.6ms.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pb_engine::{Engine, VoiceId};

/// Common callback buffer sizes.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

const LEAD: &str = "t150l8o4m2 cdefgab>c<bagfedc4 r4 e.d16c4:";
const BASS: &str = "t150l4o2m1 c c g g a a g2 f f e e d d c2:";

fn engine_with(songs: &[&str]) -> Engine {
    let mut engine = Engine::new(44100.0);
    for (voice, song) in VoiceId::all().zip(songs) {
        engine.play(voice, song).unwrap();
    }
    engine
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/render");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut engine = engine_with(&[]);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| engine.render(black_box(&mut buffer)))
        });

        let mut engine = engine_with(&[LEAD]);
        group.bench_with_input(BenchmarkId::new("one_voice", size), &size, |b, _| {
            b.iter(|| engine.render(black_box(&mut buffer)))
        });

        let mut engine = engine_with(&[LEAD, BASS]);
        group.bench_with_input(BenchmarkId::new("two_voices", size), &size, |b, _| {
            b.iter(|| engine.render(black_box(&mut buffer)))
        });

        // Every event is a sixty-fourth note, so dispatch dominates.
        let mut engine = engine_with(&["l64 cdefgab:", "l64 o5 c+d+f+g+a+:"]);
        group.bench_with_input(BenchmarkId::new("dense_events", size), &size, |b, _| {
            b.iter(|| engine.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
