use std::f64::consts::TAU;

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_hz(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

/// Phase advance per sample (radians) for a note at the given sample rate.
#[inline]
pub fn phase_increment(note: u8, sample_rate: f64) -> f64 {
    TAU * midi_note_to_hz(note) / sample_rate
}

/// Naive (non band-limited) square wave: `+level` while `sin(phase)` is
/// strictly positive, `-level` otherwise.
#[inline]
pub fn naive_square(phase: f64, level: f64) -> f64 {
    if phase.sin() > 0.0 {
        level
    } else {
        -level
    }
}
