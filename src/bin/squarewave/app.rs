//! Audio device setup: the engine lives inside the cpal callback, the rest
//! of the program talks to it through queues.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};

use tracker_audio::{
    tracker::Note, AudioEngine, EngineConfig, PipelineControl, SynthMessage,
};

/// Samples kept for the oscilloscope (one in every SCOPE_DECIMATION frames).
const SCOPE_CAPACITY: usize = 8192;
const SCOPE_DECIMATION: usize = 4;

pub const MIDDLE_C: Note = Note {
    pitch: 60,
    velocity: 0.8,
};
const MIDI_CHANNEL: u8 = 1;

pub struct AudioApp {
    pub sample_rate: u32,
    pub channels: usize,
    pub notes: Producer<SynthMessage>,
    pub control: PipelineControl,
    pub scope: Consumer<f32>,
    note_held: bool,
    _stream: cpal::Stream,
}

impl AudioApp {
    /// Open the default output device and start streaming.
    pub fn start() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        let mut engine = AudioEngine::new(
            EngineConfig::default()
                .sample_rate(sample_rate as f64)
                .channels(channels),
        );
        let notes = engine.note_queue();
        let control = engine.control();
        let (mut scope_tx, scope) = RingBuffer::<f32>::new(SCOPE_CAPACITY);

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "opening output stream"
        );

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                if engine.render_interleaved(data, channels).is_err() {
                    data.fill(0.0);
                    return;
                }
                // Scope is best-effort: drop samples when the UI falls behind
                for frame in data.chunks(channels).step_by(SCOPE_DECIMATION) {
                    let _ = scope_tx.push(frame[0]);
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            sample_rate,
            channels,
            notes,
            control,
            scope,
            note_held: false,
            _stream: stream,
        })
    }

    pub fn play_middle_c(&mut self) -> EyreResult<()> {
        self.send(MIDDLE_C.to_note_on(MIDI_CHANNEL))?;
        self.note_held = true;
        tracing::info!(note = MIDDLE_C.pitch, velocity = MIDDLE_C.velocity, "note on");
        Ok(())
    }

    pub fn release_middle_c(&mut self) -> EyreResult<()> {
        self.send(MIDDLE_C.to_note_off(MIDI_CHANNEL))?;
        self.note_held = false;
        tracing::info!(note = MIDDLE_C.pitch, "note off");
        Ok(())
    }

    pub fn toggle_note(&mut self) -> EyreResult<()> {
        if self.note_held {
            self.release_middle_c()
        } else {
            self.play_middle_c()
        }
    }

    pub fn note_held(&self) -> bool {
        self.note_held
    }

    fn send(&mut self, msg: SynthMessage) -> EyreResult<()> {
        self.notes
            .push(msg)
            .map_err(|_| eyre!("note queue is full"))
    }
}
