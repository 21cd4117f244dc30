//! Realtime audio core for a music tracker: a square-wave voice with a
//! tail-off release, a polyphonic synthesiser, and an ordered pipeline of
//! in-place effects (Freeverb-style reverb, modulated-delay chorus) with
//! named, case-insensitive parameters.
//!
//! Storage is allocated up front (constructors and `prepare`), so rendering
//! does not allocate in steady state. Control threads talk to the audio
//! thread through lock-free queues (`Synthesiser::message_queue`,
//! `EffectPipeline::attach_control`).

pub mod buffer;
pub mod config;
pub mod dsp;
pub mod effect; // Named-parameter effects and the pipeline
pub mod engine;
pub mod io;
pub mod synth; // Voice management and polyphony
pub mod tracker; // Song data model

pub use buffer::{AudioBuffer, BufferError};
pub use config::EngineConfig;
pub use effect::{
    ChorusEffect, ControlError, Effect, EffectPipeline, PipelineControl, ProcessSpec, ReverbEffect,
};
pub use engine::AudioEngine;
pub use synth::{SquareWaveSound, SquareWaveVoice, SynthMessage, Synthesiser, Voice};

pub const MAX_BLOCK_SIZE: usize = 2048;
