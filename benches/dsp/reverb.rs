//! Benchmarks for the Schroeder reverb network.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::dsp::reverb::SchroederReverb;

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.2).sin()).collect();

        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_room_size(0.5);
        reverb.set_damping(0.4);

        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += reverb.process(black_box(sample));
                }
                sum
            })
        });
    }

    group.finish();
}
