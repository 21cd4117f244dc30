#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::effect::ProcessSpec;
use crate::MAX_BLOCK_SIZE;

/// Settings for an [`AudioEngine`](crate::engine::AudioEngine).
///
/// `sample_rate` is only a fallback: the device rate passed to
/// `AudioEngine::prepare` wins.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub num_channels: usize,
    pub max_block_size: usize,
    pub num_voices: usize,
    pub voice_stealing: bool,
    pub note_queue_capacity: usize,
    pub param_queue_capacity: usize,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    pub fn max_block_size(mut self, frames: usize) -> Self {
        self.max_block_size = frames;
        self
    }

    pub fn voices(mut self, num_voices: usize) -> Self {
        self.num_voices = num_voices;
        self
    }

    pub fn voice_stealing(mut self, enabled: bool) -> Self {
        self.voice_stealing = enabled;
        self
    }

    pub fn note_queue_capacity(mut self, capacity: usize) -> Self {
        self.note_queue_capacity = capacity;
        self
    }

    pub fn param_queue_capacity(mut self, capacity: usize) -> Self {
        self.param_queue_capacity = capacity;
        self
    }

    /// The `ProcessSpec` handed to effects when the engine is prepared.
    pub fn process_spec(&self) -> ProcessSpec {
        ProcessSpec {
            sample_rate: self.sample_rate as f32,
            maximum_block_size: self.max_block_size,
            num_channels: self.num_channels,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            num_channels: 2,
            max_block_size: MAX_BLOCK_SIZE,
            num_voices: 1,
            voice_stealing: true,
            note_queue_capacity: 256,
            param_queue_capacity: 64,
        }
    }
}
