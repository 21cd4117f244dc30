//! Benchmarks for the voice and the effect units.

mod chorus;
mod reverb;
mod voice;

pub use chorus::bench_chorus;
pub use reverb::bench_reverb;
pub use voice::bench_voice;
