use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::delay::DelayLine;

/*
Chorus (modulated delay)
========================

Chorus thickens a sound by mixing the dry signal with a copy whose delay time
is slowly swept by a sine LFO. As the delay shrinks and grows the copy is
pitched slightly up and down, which reads as several players in unison.

Signal flow per channel
-----------------------

    x ──┬───────────────────────────────────────────┐
        │                                           (1 - mix)
        └─→ (−) ──→ [delay line] ──┬──→ wet ─ mix ──→ (+) ──→ y
             ↑                     │
             └──── feedback ←──────┘

Delay time
----------

    lfo       = sin(phase) * depth * 0.5            (depth in 0..1)
    delay_ms  = max(1, 20 * lfo + centre_delay_ms)

So at depth 1.0 the delay swings ±10 ms around the centre. The LFO is shared
by every channel so the stereo image stays coherent.

Feedback is subtracted at the delay input; a feedback of 0.9 gives a strong,
slightly metallic flanging colour on top of the chorus.
*/

/// Longest centre delay accepted.
pub const MAX_CENTRE_DELAY_MS: f32 = 100.0;
/// Delay swing (ms) at full LFO excursion.
const MAX_MODULATION_MS: f32 = 20.0;
const LFO_DEPTH_SCALE: f32 = 0.5;

/// Fixed configuration of the modulated delay.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusSettings {
    /// LFO rate in Hz
    pub rate: f32,
    /// Modulation depth, 0..1
    pub depth: f32,
    /// Centre of the delay sweep in milliseconds
    pub centre_delay_ms: f32,
    /// Feedback amount, -1..1
    pub feedback: f32,
    /// Dry/wet blend, 0..1
    pub mix: f32,
}

impl ChorusSettings {
    fn clamped(self) -> Self {
        Self {
            rate: self.rate.clamp(0.0, 100.0),
            depth: self.depth.clamp(0.0, 1.0),
            centre_delay_ms: self.centre_delay_ms.clamp(1.0, MAX_CENTRE_DELAY_MS),
            feedback: self.feedback.clamp(-1.0, 1.0),
            mix: self.mix.clamp(0.0, 1.0),
        }
    }
}

pub struct ModulatedDelay {
    settings: ChorusSettings,
    sample_rate: f32,
    lines: Vec<DelayLine>,
    last_output: Vec<f32>,
    lfo_phase: f32,
}

impl ModulatedDelay {
    /// Allocate delay memory for `num_channels` at `sample_rate`.
    ///
    /// This allocates; call it outside the audio callback.
    pub fn new(settings: ChorusSettings, sample_rate: f32, num_channels: usize) -> Self {
        let mut chorus = Self {
            settings: settings.clamped(),
            sample_rate,
            lines: Vec::new(),
            last_output: Vec::new(),
            lfo_phase: 0.0,
        };
        chorus.prepare(sample_rate, num_channels);
        chorus
    }

    /// Resize delay memory for a new sample rate / channel count.
    pub fn prepare(&mut self, sample_rate: f32, num_channels: usize) {
        self.sample_rate = sample_rate;
        let max_delay_ms = MAX_CENTRE_DELAY_MS + MAX_MODULATION_MS;
        let max_samples = (max_delay_ms * sample_rate / 1000.0).ceil() as usize;
        self.lines = (0..num_channels).map(|_| DelayLine::new(max_samples)).collect();
        self.last_output = vec![0.0; num_channels];
        self.lfo_phase = 0.0;
    }

    pub fn settings(&self) -> ChorusSettings {
        self.settings
    }

    pub fn num_channels(&self) -> usize {
        self.lines.len()
    }

    /// Process every channel in place.
    ///
    /// Each channel replays the LFO from the same starting phase so all
    /// channels see identical modulation. Channels beyond the prepared count
    /// are left untouched.
    pub fn process<'a>(&mut self, channels: impl Iterator<Item = &'a mut [f32]>) {
        let start = self.lfo_phase;
        let mut end = start;
        for (index, samples) in channels.enumerate().take(self.lines.len()) {
            end = self.process_channel(index, samples, start);
        }
        self.lfo_phase = end;
    }

    fn process_channel(&mut self, index: usize, samples: &mut [f32], start_phase: f32) -> f32 {
        let ChorusSettings {
            rate,
            depth,
            centre_delay_ms,
            feedback,
            mix,
        } = self.settings;
        let phase_inc = TAU * rate / self.sample_rate;
        let samples_per_ms = self.sample_rate / 1000.0;

        let line = &mut self.lines[index];
        let mut last = self.last_output[index];
        let mut phase = start_phase;

        for sample in samples.iter_mut() {
            let lfo = phase.sin() * depth * LFO_DEPTH_SCALE;
            let delay_ms = (MAX_MODULATION_MS * lfo + centre_delay_ms).max(1.0);

            let dry = *sample;
            line.write(dry - last);
            let wet = line.read_interpolated(delay_ms * samples_per_ms);
            last = wet * feedback;

            *sample = dry * (1.0 - mix) + wet * mix;

            phase += phase_inc;
            if phase >= TAU {
                phase -= TAU;
            }
        }

        self.last_output[index] = last;
        phase
    }

    pub fn reset(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::reset);
        self.last_output.fill(0.0);
        self.lfo_phase = 0.0;
    }
}
