//! Benchmarks for reverb processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tracker_audio::{buffer::AudioBuffer, effect::ProcessSpec, Effect, ReverbEffect};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            if i < 10 {
                1.0 - (i as f32 / 10.0) // Initial impulse
            } else {
                (i as f32 * 0.05).sin() * 0.1 // Quiet tail
            }
        })
        .collect()
}

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let spec = ProcessSpec {
            sample_rate: SAMPLE_RATE,
            maximum_block_size: size,
            num_channels: 2,
        };

        for (label, room_size, damping) in [
            ("small_room", 0.3, 0.5),
            ("large_room", 0.9, 0.3),
            ("high_damping", 0.5, 0.9),
        ] {
            let mut reverb = ReverbEffect::with_spec(&spec);
            reverb.set_parameter("roomSize", room_size);
            reverb.set_parameter("damping", damping);
            let mut buffer = AudioBuffer::from_channels(vec![input.clone(), input.clone()]);

            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, &size| {
                b.iter(|| {
                    reverb.process(black_box(&mut buffer), size);
                })
            });
        }

        // Frozen tank - feedback 1, no input
        let mut reverb = ReverbEffect::with_spec(&spec);
        reverb.set_parameter("freezeMode", 1.0);
        let mut buffer = AudioBuffer::from_channels(vec![input.clone(), input.clone()]);
        group.bench_with_input(BenchmarkId::new("frozen", size), &size, |b, &size| {
            b.iter(|| {
                reverb.process(black_box(&mut buffer), size);
            })
        });
    }

    group.finish();
}
