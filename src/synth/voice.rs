use crate::buffer::AudioBuffer;
use crate::dsp::oscillator::{naive_square, phase_increment};
use crate::synth::sound::{Sound, SquareWaveSound};

/*
Square-Wave Voice
=================

One voice plays one note at a time. Polyphony comes from owning several
voices (see `Synthesiser`), not from a voice mixing notes itself.

State machine
-------------

                note_on                  note_off(tail)
    ┌──────┐ ───────────→ ┌──────────┐ ───────────────→ ┌───────────┐
    │ Idle │              │ Sounding │                  │ Releasing │
    └──────┘ ←─────────── └──────────┘                  └───────────┘
       ↑     note_off(no tail)                                │
       └──────────────────────────────────────────────────────┘
                     tail_off <= 0.005 (inside render)

The state is derived rather than stored:

    angle_delta == 0          → Idle
    tail_off > 0              → Releasing
    otherwise                 → Sounding

Tail-off
--------

After a note-off with tail, every rendered sample is scaled by `tail_off`,
which starts at 1.0 and is multiplied by 0.99 after each sample:

    amplitude[k] = level * 0.99^k

When it drops to 0.005 or below the voice stops on the spot, in the same
render call. That takes ceil(ln 0.005 / ln 0.99) = 528 samples.

Rendering is ADDITIVE: samples are summed into the buffer so several voices
can share one block. The caller clears the block first.
*/

/// Per-sample release multiplier.
pub const TAIL_OFF_DECAY: f64 = 0.99;
/// The voice stops once the release multiplier reaches this floor.
pub const TAIL_OFF_FLOOR: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Sounding,
    Releasing,
}

/// Interface the synthesiser drives each voice through.
pub trait Voice: Send {
    fn can_play(&self, sound: &dyn Sound) -> bool;

    /// Called before the first render and whenever the sample rate changes.
    fn prepare(&mut self, sample_rate: f64);

    /// Start `note`. `velocity` is expected in `[0, 1]` and is not clamped.
    fn note_on(&mut self, note: u8, velocity: f32);

    /// Stop the current note, with a release tail or immediately.
    fn note_off(&mut self, velocity: f32, allow_tail_off: bool);

    /// Add `num_samples` frames starting at `start` into every channel.
    fn render(&mut self, buffer: &mut AudioBuffer, start: usize, num_samples: usize);

    /// The note being played (including while releasing).
    fn current_note(&self) -> Option<u8>;

    fn is_active(&self) -> bool {
        self.current_note().is_some()
    }

    /// Still sounding after a note-off.
    fn is_releasing(&self) -> bool {
        false
    }

    fn pitch_wheel_moved(&mut self, _value: u16) {}

    fn controller_moved(&mut self, _controller: u8, _value: u8) {}
}

pub struct SquareWaveVoice {
    current_angle: f64,
    angle_delta: f64,
    level: f64,
    tail_off: f64,
    sample_rate: f64,
    note: Option<u8>,
}

impl SquareWaveVoice {
    pub fn new() -> Self {
        Self {
            current_angle: 0.0,
            angle_delta: 0.0,
            level: 0.5,
            tail_off: 0.0,
            sample_rate: 44_100.0,
            note: None,
        }
    }

    pub fn state(&self) -> VoiceState {
        if self.angle_delta == 0.0 {
            VoiceState::Idle
        } else if self.tail_off > 0.0 {
            VoiceState::Releasing
        } else {
            VoiceState::Sounding
        }
    }

    /// Current release multiplier (0.0 when not releasing).
    pub fn tail_off(&self) -> f64 {
        self.tail_off
    }

    /// Phase advance per sample in radians.
    pub fn angle_delta(&self) -> f64 {
        self.angle_delta
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn stop(&mut self) {
        self.note = None;
        self.angle_delta = 0.0;
    }
}

impl Default for SquareWaveVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for SquareWaveVoice {
    fn can_play(&self, sound: &dyn Sound) -> bool {
        sound.as_any().is::<SquareWaveSound>()
    }

    fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn note_on(&mut self, note: u8, velocity: f32) {
        self.current_angle = 0.0;
        self.level = velocity as f64;
        self.tail_off = 0.0;
        self.angle_delta = phase_increment(note, self.sample_rate);
        self.note = Some(note);
    }

    fn note_off(&mut self, _velocity: f32, allow_tail_off: bool) {
        if allow_tail_off {
            // Re-entrant note-offs must not restart the release curve
            if self.state() == VoiceState::Sounding {
                self.tail_off = 1.0;
            }
        } else {
            self.stop();
        }
    }

    fn render(&mut self, buffer: &mut AudioBuffer, start: usize, num_samples: usize) {
        if self.angle_delta == 0.0 {
            return;
        }
        debug_assert!(buffer.check_region(start, num_samples).is_ok());

        let end = start + num_samples;
        if self.tail_off > 0.0 {
            for frame in start..end {
                let sample = naive_square(self.current_angle, self.level) * self.tail_off;
                buffer.add_to_all_channels(frame, sample as f32);

                self.current_angle += self.angle_delta;
                self.tail_off *= TAIL_OFF_DECAY;

                if self.tail_off <= TAIL_OFF_FLOOR {
                    self.stop();
                    break;
                }
            }
        } else {
            for frame in start..end {
                let sample = naive_square(self.current_angle, self.level);
                buffer.add_to_all_channels(frame, sample as f32);

                self.current_angle += self.angle_delta;
            }
        }
    }

    fn current_note(&self) -> Option<u8> {
        self.note
    }

    fn is_releasing(&self) -> bool {
        self.state() == VoiceState::Releasing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 44_100.0;

    fn playing(note: u8, velocity: f32) -> SquareWaveVoice {
        let mut voice = SquareWaveVoice::new();
        voice.prepare(SAMPLE_RATE);
        voice.note_on(note, velocity);
        voice
    }

    #[test]
    fn test_idle_voice_renders_nothing() {
        let mut voice = SquareWaveVoice::new();
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.25; 64]]);

        voice.render(&mut buffer, 0, 64);

        assert_eq!(voice.state(), VoiceState::Idle);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_note_on_produces_bounded_square() {
        let mut voice = playing(60, 0.8);
        assert_eq!(voice.state(), VoiceState::Sounding);
        assert_eq!(voice.current_note(), Some(60));

        let mut buffer = AudioBuffer::new(2, 1024);
        voice.render(&mut buffer, 0, 1024);

        for ch in 0..2 {
            for &s in buffer.channel(ch) {
                assert!((s.abs() - 0.8).abs() < 1e-6, "sample {} is not +/-0.8", s);
            }
        }
    }

    #[test]
    fn test_square_flips_at_note_frequency() {
        let mut voice = playing(60, 0.8);
        let frames = SAMPLE_RATE as usize;
        let mut buffer = AudioBuffer::new(1, frames);
        voice.render(&mut buffer, 0, frames);

        let flips = buffer
            .channel(0)
            .windows(2)
            .filter(|pair| pair[0].signum() != pair[1].signum())
            .count();

        // Two sign changes per cycle of 261.63 Hz
        assert!((521..=525).contains(&flips), "got {} sign flips", flips);
    }

    #[test]
    fn test_phase_increment_independent_of_velocity() {
        let loud = playing(69, 1.0);
        let soft = playing(69, 0.1);
        assert_eq!(loud.angle_delta(), soft.angle_delta());
        assert!((loud.angle_delta() - std::f64::consts::TAU * 440.0 / SAMPLE_RATE).abs() < 1e-12);
    }

    #[test]
    fn test_render_is_additive_and_offset() {
        let mut voice = playing(69, 0.5);
        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0; 16]]);

        voice.render(&mut buffer, 8, 4);

        let ch = buffer.channel(0);
        assert!(ch[..8].iter().all(|&s| s == 1.0));
        // First sample is at phase 0, where sin is not positive
        assert_eq!(ch[8], 0.5);
        assert!(ch[9..12].iter().all(|&s| s == 1.5));
        assert!(ch[12..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_tail_off_decays_and_self_silences() {
        let mut voice = playing(60, 0.8);
        let mut warmup = AudioBuffer::new(1, 256);
        voice.render(&mut warmup, 0, 256);

        voice.note_off(0.0, true);
        assert_eq!(voice.state(), VoiceState::Releasing);

        let mut buffer = AudioBuffer::new(1, 1024);
        voice.render(&mut buffer, 0, 1024);
        let ch = buffer.channel(0);

        let expected_len = (TAIL_OFF_FLOOR.ln() / TAIL_OFF_DECAY.ln()).ceil() as usize;
        assert_eq!(expected_len, 528);

        for (k, &s) in ch[..expected_len].iter().enumerate() {
            let expected = 0.8 * TAIL_OFF_DECAY.powi(k as i32);
            assert!((s.abs() as f64 - expected).abs() < 1e-5, "frame {}: {}", k, s);
        }
        assert!(ch[expected_len..].iter().all(|&s| s == 0.0));

        assert_eq!(voice.state(), VoiceState::Idle);
        assert_eq!(voice.current_note(), None);

        let mut after = AudioBuffer::new(1, 256);
        voice.render(&mut after, 0, 256);
        assert_eq!(after.peak(), 0.0);
    }

    #[test]
    fn test_hard_stop_is_immediate() {
        let mut voice = playing(60, 0.8);
        let mut warmup = AudioBuffer::new(1, 64);
        voice.render(&mut warmup, 0, 64);

        voice.note_off(0.0, false);
        assert_eq!(voice.state(), VoiceState::Idle);
        assert_eq!(voice.current_note(), None);

        let mut buffer = AudioBuffer::new(1, 64);
        voice.render(&mut buffer, 0, 64);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_second_note_off_does_not_restart_tail() {
        let mut voice = playing(60, 0.8);
        voice.note_off(0.0, true);

        let mut buffer = AudioBuffer::new(1, 100);
        voice.render(&mut buffer, 0, 100);
        let tail_before = voice.tail_off();

        voice.note_off(0.0, true);
        assert_eq!(voice.tail_off(), tail_before);
        assert!((tail_before - TAIL_OFF_DECAY.powi(100)).abs() < 1e-12);
    }

    #[test]
    fn test_note_on_during_release_restarts_cleanly() {
        let mut voice = playing(60, 0.8);
        voice.note_off(0.0, true);
        let mut buffer = AudioBuffer::new(1, 100);
        voice.render(&mut buffer, 0, 100);

        voice.note_on(64, 0.5);
        assert_eq!(voice.state(), VoiceState::Sounding);
        assert_eq!(voice.tail_off(), 0.0);
        assert_eq!(voice.current_note(), Some(64));
    }

    #[test]
    fn test_can_play_only_square_sounds() {
        struct OtherSound;
        impl Sound for OtherSound {
            fn applies_to_note(&self, _note: u8) -> bool {
                true
            }
            fn applies_to_channel(&self, _channel: u8) -> bool {
                true
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let voice = SquareWaveVoice::new();
        assert!(voice.can_play(&SquareWaveSound));
        assert!(!voice.can_play(&OtherSound));
    }
}
