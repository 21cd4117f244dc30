//! Benchmarks for square-wave voice rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tracker_audio::{buffer::AudioBuffer, SquareWaveVoice, Voice};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/voice");

    for &size in BLOCK_SIZES {
        let mut buffer = AudioBuffer::new(2, size);

        // Sustained note - one branch per sample
        let mut voice = SquareWaveVoice::new();
        voice.prepare(SAMPLE_RATE as f64);
        voice.note_on(60, 0.8);
        group.bench_with_input(BenchmarkId::new("sounding", size), &size, |b, &size| {
            b.iter(|| {
                buffer.clear();
                voice.render(black_box(&mut buffer), 0, size);
            })
        });

        // Release - retriggered each iteration so the tail never ends
        let mut voice = SquareWaveVoice::new();
        voice.prepare(SAMPLE_RATE as f64);
        group.bench_with_input(BenchmarkId::new("tail_off", size), &size, |b, &size| {
            b.iter(|| {
                voice.note_on(60, 0.8);
                voice.note_off(0.0, true);
                buffer.clear();
                voice.render(black_box(&mut buffer), 0, size);
            })
        });
    }

    group.finish();
}
