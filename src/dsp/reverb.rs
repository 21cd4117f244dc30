//! Reverb - Room Simulation via Delay Networks
//!
//! Reverb simulates the sound of a space by creating many delayed, filtered
//! reflections of the input signal. This implementation follows the Freeverb
//! topology: a bank of damped comb filters in parallel, then a chain of
//! all-pass diffusers, duplicated per stereo side with slightly detuned
//! delay lengths.
//!
//! # Architecture (per side)
//!
//! ```text
//!               ┌──→ [Comb 1] ──┐
//! (L+R)·gain ──┼──→   ...     ──┼──→ (+) ──→ [AP 1] → [AP 2] → [AP 3] → [AP 4] ──→ wet
//!               └──→ [Comb 8] ──┘
//! ```
//!
//! ## Comb Filters
//!
//! Each comb filter feeds its delayed output back through a one-pole lowpass,
//! so high frequencies die away faster than lows (the "damping" control).
//!
//! ```text
//! y[n]    = buf[n - delay]
//! lp[n]   = y[n] * (1 - damp) + lp[n-1] * damp
//! buf[n]  = x[n] + lp[n] * feedback
//! ```
//!
//! ## Allpass Filters
//!
//! Freeverb's diffusers use a fixed coefficient of 0.5:
//!
//! ```text
//! b       = buf[n - delay]
//! buf[n]  = x[n] + 0.5 * b
//! y[n]    = b - x[n]
//! ```
//!
//! # Parameters
//!
//! All six controls live in `[0, 1]`:
//!
//! - **room_size**: comb feedback, `0.7 + 0.28 * room_size`
//! - **damping**: comb lowpass coefficient, `0.4 * damping`
//! - **wet_level / dry_level**: output gains (scaled by 3 and 2)
//! - **width**: stereo cross-feed of the two wet sides
//! - **freeze_mode**: at or above 0.5 the tank recirculates forever and the
//!   input is muted

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Max comb filter delay: longest tuning plus spread at 192kHz fits in 9600 samples
const MAX_COMB_DELAY: usize = 9600;
/// Max allpass filter delay: longest tuning plus spread at 192kHz
const MAX_ALLPASS_DELAY: usize = 2560;

const NUM_COMBS: usize = 8;
const NUM_ALLPASSES: usize = 4;

/// Delay lengths in samples at 44.1kHz.
const COMB_TUNINGS: [usize; NUM_COMBS] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; NUM_ALLPASSES] = [556, 441, 341, 225];
/// Extra samples added to every right-side delay to decorrelate the sides.
const STEREO_SPREAD: usize = 23;
const TUNING_SAMPLE_RATE: f32 = 44_100.0;

const FIXED_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;

/// A damped comb filter (pre-allocated, RT-safe)
pub struct CombFilter {
    buffer: Box<[f32]>,
    delay_samples: usize,
    write_pos: usize,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; MAX_COMB_DELAY].into_boxed_slice(),
            delay_samples: delay_samples.clamp(1, MAX_COMB_DELAY),
            write_pos: 0,
            filter_state: 0.0,
        }
    }

    /// Set delay length (RT-safe, no allocation)
    pub fn set_delay(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.clamp(1, MAX_COMB_DELAY);
        self.write_pos %= self.delay_samples;
    }

    pub fn delay(&self) -> usize {
        self.delay_samples
    }

    #[inline]
    pub fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // One-pole lowpass in the feedback path absorbs high frequencies
        self.filter_state = output * (1.0 - damp) + self.filter_state * damp;

        self.buffer[self.write_pos] = input + self.filter_state * feedback;
        self.write_pos = (self.write_pos + 1) % self.delay_samples;

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// An allpass diffuser (pre-allocated, RT-safe)
pub struct AllpassFilter {
    buffer: Box<[f32]>,
    delay_samples: usize,
    write_pos: usize,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; MAX_ALLPASS_DELAY].into_boxed_slice(),
            delay_samples: delay_samples.clamp(1, MAX_ALLPASS_DELAY),
            write_pos: 0,
        }
    }

    /// Set delay length (RT-safe, no allocation)
    pub fn set_delay(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.clamp(1, MAX_ALLPASS_DELAY);
        self.write_pos %= self.delay_samples;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + buffered * 0.5;
        self.write_pos = (self.write_pos + 1) % self.delay_samples;
        buffered - input
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// The six user-facing reverb controls, each in `[0, 1]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParameters {
    pub room_size: f32,
    pub damping: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub width: f32,
    pub freeze_mode: f32,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
            freeze_mode: 0.0,
        }
    }
}

impl ReverbParameters {
    pub fn is_frozen(&self) -> bool {
        self.freeze_mode >= 0.5
    }
}

/// One side of the tank: eight combs into four allpasses.
struct Side {
    combs: [CombFilter; NUM_COMBS],
    allpasses: [AllpassFilter; NUM_ALLPASSES],
}

impl Side {
    fn new() -> Self {
        Self {
            combs: std::array::from_fn(|i| CombFilter::new(COMB_TUNINGS[i])),
            allpasses: std::array::from_fn(|i| AllpassFilter::new(ALLPASS_TUNINGS[i])),
        }
    }

    fn configure(&mut self, sample_rate: f32, spread: usize) {
        let scale = sample_rate / TUNING_SAMPLE_RATE;
        for (comb, &tuning) in self.combs.iter_mut().zip(COMB_TUNINGS.iter()) {
            comb.set_delay(((tuning + spread) as f32 * scale) as usize);
        }
        for (allpass, &tuning) in self.allpasses.iter_mut().zip(ALLPASS_TUNINGS.iter()) {
            allpass.set_delay(((tuning + spread) as f32 * scale) as usize);
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input, damp, feedback);
        }
        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }

    fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::reset);
        self.allpasses.iter_mut().for_each(AllpassFilter::reset);
    }
}

/// Stereo Freeverb tank.
///
/// All delay memory is allocated in [`FreeverbTank::new`]; changing sample rate
/// or parameters afterwards never allocates.
pub struct FreeverbTank {
    left: Side,
    right: Side,
    params: ReverbParameters,
    // Derived coefficients, recomputed on every parameter write
    gain: f32,
    wet1: f32,
    wet2: f32,
    dry: f32,
    damp: f32,
    feedback: f32,
}

impl FreeverbTank {
    pub fn new(sample_rate: f32) -> Self {
        let mut tank = Self {
            left: Side::new(),
            right: Side::new(),
            params: ReverbParameters::default(),
            gain: FIXED_GAIN,
            wet1: 0.0,
            wet2: 0.0,
            dry: 0.0,
            damp: 0.0,
            feedback: 0.0,
        };
        tank.set_sample_rate(sample_rate);
        tank.set_parameters(ReverbParameters::default());
        tank
    }

    /// Rescale delay lengths for a new sample rate (RT-safe, no allocation).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.left.configure(sample_rate, 0);
        self.right.configure(sample_rate, STEREO_SPREAD);
    }

    pub fn parameters(&self) -> ReverbParameters {
        self.params
    }

    /// Replace the whole parameter set at once and derive the coefficients.
    pub fn set_parameters(&mut self, params: ReverbParameters) {
        self.params = params;

        let wet = params.wet_level * WET_SCALE;
        self.wet1 = 0.5 * wet * (1.0 + params.width);
        self.wet2 = 0.5 * wet * (1.0 - params.width);
        self.dry = params.dry_level * DRY_SCALE;

        if params.is_frozen() {
            self.gain = 0.0;
            self.damp = 0.0;
            self.feedback = 1.0;
        } else {
            self.gain = FIXED_GAIN;
            self.damp = params.damping * DAMP_SCALE;
            self.feedback = params.room_size * ROOM_SCALE + ROOM_OFFSET;
        }
    }

    /// Process a stereo pair in place.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * self.gain;
            let out_l = self.left.process(input, self.damp, self.feedback);
            let out_r = self.right.process(input, self.damp, self.feedback);

            *l = out_l * self.wet1 + out_r * self.wet2 + *l * self.dry;
            *r = out_r * self.wet1 + out_l * self.wet2 + *r * self.dry;
        }
    }

    /// Process a single channel in place using the left side of the tank.
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let input = *sample * self.gain;
            let out = self.left.process(input, self.damp, self.feedback);
            *sample = out * self.wet1 + *sample * self.dry;
        }
    }

    /// Reset all filter states
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_filter_creates_echo() {
        let mut comb = CombFilter::new(10);

        // Feed an impulse
        let out1 = comb.process(1.0, 0.0, 0.5);
        assert!(out1.abs() < 0.01); // No output yet (delayed)

        for _ in 0..9 {
            comb.process(0.0, 0.0, 0.5);
        }

        // Now we should see the echo
        let echo = comb.process(0.0, 0.0, 0.5);
        assert!((echo - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let mut allpass = AllpassFilter::new(5);

        let mut energy_in = 0.0;
        let mut energy_out = 0.0;

        for i in 0..200 {
            let input = if i < 10 { 1.0 } else { 0.0 };
            let output = allpass.process(input);
            energy_in += input * input;
            energy_out += output * output;
        }

        assert!(energy_out > energy_in * 0.8);
    }

    #[test]
    fn test_delays_scale_with_sample_rate() {
        let tank = FreeverbTank::new(88_200.0);
        assert_eq!(tank.left.combs[0].delay(), COMB_TUNINGS[0] * 2);
        assert_eq!(tank.right.combs[0].delay(), (COMB_TUNINGS[0] + STEREO_SPREAD) * 2);
    }

    #[test]
    fn test_tank_produces_tail() {
        let mut tank = FreeverbTank::new(48_000.0);
        let mut left = vec![0.0f32; 4096];
        let mut right = vec![0.0f32; 4096];
        left[0] = 1.0;
        right[0] = 1.0;

        tank.process_stereo(&mut left, &mut right);

        let tail: f32 = left[2000..].iter().map(|x| x * x).sum();
        assert!(tail > 0.0, "Reverb should produce a tail after impulse");
    }

    #[test]
    fn test_dry_only_scales_input() {
        let mut tank = FreeverbTank::new(48_000.0);
        tank.set_parameters(ReverbParameters {
            wet_level: 0.0,
            dry_level: 0.5,
            ..ReverbParameters::default()
        });

        let mut samples = vec![0.5, -0.25, 0.75];
        tank.process_mono(&mut samples);
        assert_eq!(samples, vec![0.5, -0.25, 0.75]);
    }

    #[test]
    fn test_freeze_mutes_input() {
        let mut tank = FreeverbTank::new(48_000.0);
        tank.set_parameters(ReverbParameters {
            freeze_mode: 1.0,
            dry_level: 0.0,
            ..ReverbParameters::default()
        });

        let mut left = vec![1.0f32; 8192];
        let mut right = vec![1.0f32; 8192];
        tank.process_stereo(&mut left, &mut right);

        // Frozen tank was empty and takes no new input
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn test_reverb_stability() {
        let mut tank = FreeverbTank::new(48_000.0);
        tank.set_parameters(ReverbParameters {
            room_size: 1.0,
            damping: 0.0,
            ..ReverbParameters::default()
        });

        let mut samples = vec![0.1f32; 20_000];
        tank.process_mono(&mut samples);
        for out in samples {
            assert!(out.is_finite(), "Reverb output should be finite");
            assert!(out.abs() < 10.0, "Reverb output unstable: {}", out);
        }
    }
}
