//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Integer delay, echo-style
        let mut line = DelayLine::new(96_000);
        group.bench_with_input(BenchmarkId::new("read_write", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += line.read(black_box(4_800));
                    line.write(sample);
                }
                sum
            })
        });

        // Fractional delay, chorus-style
        let mut line = DelayLine::new(2_048);
        for &sample in &input {
            line.write(sample);
        }
        group.bench_with_input(BenchmarkId::new("read_interpolated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay = 336.0 + (i as f32 * 0.01).sin() * 48.0;
                    sum += line.read_interpolated(black_box(delay));
                }
                sum
            })
        });
    }

    group.finish();
}
