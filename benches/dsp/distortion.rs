//! Benchmarks for waveshaping.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::dsp::shape::{hard_clip_buffer, soft_clip_buffer};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.3).sin()).collect();

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                soft_clip_buffer(black_box(&mut buffer), 4.0);
            })
        });

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("hard_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                hard_clip_buffer(black_box(&mut buffer), 4.0, 1.0);
            })
        });
    }

    group.finish();
}
