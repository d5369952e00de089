//! Full-chain benchmarks: what one audio callback actually costs.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicepulse::chain::EffectChain;
use voicepulse::preset;

use crate::BLOCK_SIZES;

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.11).sin() * 0.5).collect();

        // Default settings: pitch idle, the cheap path
        let mut chain = EffectChain::new(48_000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer));
            })
        });

        // Deep preset: vocoder engaged, the worst case
        let mut chain = EffectChain::new(48_000.0);
        for (id, params) in preset::DEEP.entries {
            chain.apply(*id, params);
        }
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("preset_deep", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
