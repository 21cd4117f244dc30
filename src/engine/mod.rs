//! The block renderer that ties the synthesiser to the effect pipeline.
//!
//! ```ignore
//! let mut engine = AudioEngine::new(EngineConfig::default());
//! let mut notes = engine.note_queue();
//! let mut control = engine.control();
//!
//! notes.push(SynthMessage::NoteOn { channel: 1, note: 60, velocity: 0.8 })?;
//! control.set_parameter(0, "wetLevel", 0.5)?;
//!
//! // audio thread
//! engine.render_interleaved(data, channels)?;
//! ```

use rtrb::Producer;

use crate::buffer::{AudioBuffer, BufferError};
use crate::config::EngineConfig;
use crate::effect::{EffectPipeline, PipelineControl, ReverbEffect};
use crate::synth::{SquareWaveSound, SquareWaveVoice, SynthMessage, Synthesiser};

pub struct AudioEngine {
    config: EngineConfig,
    synth: Synthesiser,
    pipeline: EffectPipeline,
    buffer: AudioBuffer,
}

impl AudioEngine {
    /// Square-wave voices into a single reverb.
    pub fn new(config: EngineConfig) -> Self {
        let mut synth = Synthesiser::new()
            .with_sound(SquareWaveSound)
            .with_voice_stealing(config.voice_stealing);
        for _ in 0..config.num_voices {
            synth.add_voice(Box::new(SquareWaveVoice::new()));
        }

        let pipeline = EffectPipeline::new().with(ReverbEffect::with_spec(&config.process_spec()));
        Self::with_parts(config, synth, pipeline)
    }

    pub fn with_parts(config: EngineConfig, synth: Synthesiser, pipeline: EffectPipeline) -> Self {
        let mut engine = Self {
            config,
            synth,
            pipeline,
            buffer: AudioBuffer::new(0, 0),
        };
        engine.prepare(config.sample_rate, config.num_channels);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn synth(&self) -> &Synthesiser {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut Synthesiser {
        &mut self.synth
    }

    pub fn pipeline(&self) -> &EffectPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut EffectPipeline {
        &mut self.pipeline
    }

    /// Sender for note messages, drained at the start of every block.
    pub fn note_queue(&mut self) -> Producer<SynthMessage> {
        self.synth.message_queue(self.config.note_queue_capacity)
    }

    /// Control handle for the effect parameters.
    pub fn control(&mut self) -> PipelineControl {
        self.pipeline.attach_control(self.config.param_queue_capacity)
    }

    /// Resize for a new device format. Allocates; call before streaming.
    pub fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.config.sample_rate = sample_rate;
        self.config.num_channels = num_channels.max(1);
        self.config.max_block_size = self.config.max_block_size.max(1);

        self.synth.set_current_playback_sample_rate(sample_rate);
        self.pipeline.prepare(&self.config.process_spec());
        self.buffer = AudioBuffer::new(self.config.num_channels, self.config.max_block_size);

        tracing::debug!(
            sample_rate,
            channels = self.config.num_channels,
            block = self.config.max_block_size,
            "engine prepared"
        );
    }

    /// Render one block of at most `max_block_size` frames: clear, add the
    /// voices, then run the effects in order.
    pub fn process_block(&mut self, num_frames: usize) -> Result<&AudioBuffer, BufferError> {
        self.buffer.check_region(0, num_frames)?;
        self.buffer.clear_region(0, num_frames);

        self.synth.render_next_block(&mut self.buffer, 0, num_frames)?;
        self.pipeline.process(&mut self.buffer, num_frames)?;

        Ok(&self.buffer)
    }

    /// Fill an interleaved device buffer, rendering in blocks of at most
    /// `max_block_size` frames.
    pub fn render_interleaved(&mut self, out: &mut [f32], out_channels: usize) -> Result<(), BufferError> {
        if out_channels == 0 {
            return Err(BufferError::NoChannels);
        }

        let block = self.config.max_block_size;
        for chunk in out.chunks_mut(block * out_channels) {
            let frames = chunk.len() / out_channels;
            self.process_block(frames)?
                .interleave_into(chunk, out_channels, frames);
        }
        Ok(())
    }
}
