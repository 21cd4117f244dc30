//! Engine benchmarks: voices summed and run through the reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tracker_audio::{AudioEngine, EngineConfig};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const CHORD: [u8; 4] = [60, 64, 67, 71];

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        // The demo path: one voice into the reverb
        let mut engine = AudioEngine::new(
            EngineConfig::default()
                .sample_rate(SAMPLE_RATE as f64)
                .max_block_size(size),
        );
        engine.synth_mut().note_on(1, 60, 0.8);
        group.bench_with_input(BenchmarkId::new("single_voice", size), &size, |b, &size| {
            b.iter(|| engine.process_block(black_box(size)).map(|buffer| buffer.peak()))
        });

        // Four-voice chord
        let mut engine = AudioEngine::new(
            EngineConfig::default()
                .sample_rate(SAMPLE_RATE as f64)
                .max_block_size(size)
                .voices(CHORD.len()),
        );
        for note in CHORD {
            engine.synth_mut().note_on(1, note, 0.25);
        }
        group.bench_with_input(BenchmarkId::new("chord", size), &size, |b, &size| {
            b.iter(|| engine.process_block(black_box(size)).map(|buffer| buffer.peak()))
        });

        // Interleaved output, as a device callback sees it
        let mut engine = AudioEngine::new(
            EngineConfig::default()
                .sample_rate(SAMPLE_RATE as f64)
                .max_block_size(size),
        );
        engine.synth_mut().note_on(1, 60, 0.8);
        let mut out = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |b, _| {
            b.iter(|| engine.render_interleaved(black_box(&mut out), 2))
        });
    }

    group.finish();
}
