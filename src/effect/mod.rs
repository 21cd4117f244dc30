//! In-place effect units and the pipeline that runs them.
//!
//! Every unit implements [`Effect`]: it rewrites an [`AudioBuffer`] in place
//! and exposes a case-insensitive, named parameter surface. The default trait
//! methods are the "generic" behaviour (store whatever is written); units with
//! a real control surface override `set_parameter` and `rules` to validate.

pub mod chorus;
pub mod params;
pub mod pipeline;
pub mod reverb;

pub use chorus::ChorusEffect;
pub use params::{ParamRange, ParamRules, ParameterStore};
pub use pipeline::{ControlError, EffectPipeline, ParamChange, PipelineControl};
pub use reverb::{ReverbEffect, ReverbParam};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{buffer::AudioBuffer, MAX_BLOCK_SIZE};

/// Host configuration handed to effects before processing starts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f32,
    pub maximum_block_size: usize,
    pub num_channels: usize,
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            maximum_block_size: MAX_BLOCK_SIZE,
            num_channels: 2,
        }
    }
}

/// State every effect carries: its lower-cased name and its parameter store.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectCore {
    name: String,
    parameters: ParameterStore,
}

impl EffectCore {
    pub fn new(name: &str) -> Self {
        Self {
            name: params::normalize_name(name),
            parameters: ParameterStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }
}

/// An audio effect that rewrites a buffer in place.
///
/// `process` runs on the audio thread and must not allocate, block or panic.
/// The parameter methods are cheap but may allocate the first time a new name
/// is stored, so cross-thread writes should go through [`PipelineControl`].
pub trait Effect: Send {
    /// Access to the shared name/parameter state.
    ///
    /// Implementation hook; callers change parameters through
    /// [`Effect::set_parameter`] so validation is never bypassed.
    fn core(&self) -> &EffectCore;

    fn core_mut(&mut self) -> &mut EffectCore;

    /// Apply the effect to the first `num_samples` frames of every channel.
    fn process(&mut self, buffer: &mut AudioBuffer, num_samples: usize);

    /// Called before the first block and whenever the host format changes.
    /// May allocate.
    fn prepare(&mut self, _spec: &ProcessSpec) {}

    /// Clear internal history (delay lines, tails).
    fn reset(&mut self) {}

    /// Channel count the effect was prepared for, if it keeps per-channel
    /// state. `None` means any channel count is fine.
    fn prepared_channels(&self) -> Option<usize> {
        None
    }

    /// Lower-cased effect name, fixed at construction.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Store `value` under `name`. The generic version does no validation.
    fn set_parameter(&mut self, name: &str, value: f32) {
        self.core_mut().parameters_mut().set(name, value);
    }

    fn get_parameter(&self, name: &str) -> Option<f32> {
        self.core().parameters().get(name)
    }

    /// Read-only view of every stored parameter.
    fn parameters(&self) -> &ParameterStore {
        self.core().parameters()
    }

    /// The validation this effect's `set_parameter` applies.
    ///
    /// Must agree with `set_parameter`: the control thread uses it to mirror
    /// writes without touching the live effect.
    fn rules(&self) -> ParamRules {
        ParamRules::Open
    }
}

/// Panics in debug builds when `buffer` has more channels than `prepared`.
#[inline]
pub(crate) fn debug_check_channels(buffer: &AudioBuffer, prepared: usize) {
    debug_assert!(
        buffer.num_channels() <= prepared,
        "buffer of {} channels exceeds the {} prepared",
        buffer.num_channels(),
        prepared
    );
}

/// Clamp a requested block length to what the buffer actually holds.
#[inline]
pub(crate) fn block_len(buffer: &AudioBuffer, num_samples: usize) -> usize {
    debug_assert!(
        num_samples <= buffer.num_frames(),
        "block of {} frames exceeds buffer of {}",
        num_samples,
        buffer.num_frames()
    );
    num_samples.min(buffer.num_frames())
}
