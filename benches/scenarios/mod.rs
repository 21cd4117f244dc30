//! Benchmarks for complete render paths.

mod engine;

pub use engine::bench_engine;
