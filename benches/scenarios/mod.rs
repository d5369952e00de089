//! Benchmarks for assembled real-world chains.

mod chain;

pub use chain::bench_chain;
