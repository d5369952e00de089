//! Benchmarks for the phase-vocoder pitch shifter - the most expensive
//! stage in the chain by a wide margin.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::dsp::vocoder::PitchShifter;

use crate::BLOCK_SIZES;

pub fn bench_vocoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/vocoder");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.06).sin()).collect();

        let mut shifter = PitchShifter::new(48_000.0);
        let mut buffer = input.clone();

        group.bench_with_input(BenchmarkId::new("shift_fifth_down", size), &size, |b, _| {
            let ratio = 2.0f32.powf(-5.0 / 12.0);
            b.iter(|| {
                buffer.copy_from_slice(&input);
                shifter.process(black_box(&mut buffer), black_box(ratio));
            })
        });
    }

    group.finish();
}
