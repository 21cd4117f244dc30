//! Benchmarks for the modulated-delay chorus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tracker_audio::{buffer::AudioBuffer, effect::ProcessSpec, ChorusEffect, Effect};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_chorus(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/chorus");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();

        for channels in [1, 2] {
            let spec = ProcessSpec {
                sample_rate: SAMPLE_RATE,
                maximum_block_size: size,
                num_channels: channels,
            };
            let mut chorus = ChorusEffect::with_spec(&spec);
            let mut buffer = AudioBuffer::from_channels(vec![input.clone(); channels]);

            let label = if channels == 1 { "mono" } else { "stereo" };
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, &size| {
                b.iter(|| {
                    chorus.process(black_box(&mut buffer), size);
                })
            });
        }
    }

    group.finish();
}
