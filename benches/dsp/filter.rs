//! Benchmarks for the biquad filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::dsp::filter::Biquad;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = Biquad::lowpass(14_000.0, 48_000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });

        let mut filter = Biquad::highpass(80.0, 48_000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("highpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
