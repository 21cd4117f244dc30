//! Low-level DSP primitives used by the effects and voices.
//!
//! These components allocate only at construction (or in `prepare`) and are
//! realtime-safe afterwards, making them safe to embed directly inside effect
//! and voice structs. They stay focused on the signal-processing math; the
//! parameter surfaces live in `effect`.

/// Modulated delay line behind the chorus effect.
pub mod chorus;
/// Fractional delay line.
pub mod delay;
/// Pitch conversion and the naive square waveform.
pub mod oscillator;
/// Freeverb comb/all-pass reverberation network.
pub mod reverb;
