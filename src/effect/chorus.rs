use crate::buffer::AudioBuffer;
use crate::dsp::chorus::{ChorusSettings, ModulatedDelay};
use crate::effect::{block_len, debug_check_channels, Effect, EffectCore, ProcessSpec};

/// Settings the chorus is built with. They are not reconfigurable at runtime.
pub const CHORUS_SETTINGS: ChorusSettings = ChorusSettings {
    rate: 1.5,
    depth: 0.5,
    centre_delay_ms: 7.0,
    feedback: 0.9,
    mix: 0.5,
};

/// Chorus with a fixed configuration.
///
/// Uses the generic parameter behaviour: writes are stored but never reach
/// the delay line, and the store starts out empty.
pub struct ChorusEffect {
    core: EffectCore,
    chorus: ModulatedDelay,
}

impl ChorusEffect {
    pub fn new() -> Self {
        Self::with_spec(&ProcessSpec::default())
    }

    pub fn with_spec(spec: &ProcessSpec) -> Self {
        Self {
            core: EffectCore::new("Chorus"),
            chorus: ModulatedDelay::new(CHORUS_SETTINGS, spec.sample_rate, spec.num_channels),
        }
    }

    pub fn settings(&self) -> ChorusSettings {
        self.chorus.settings()
    }
}

impl Default for ChorusEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for ChorusEffect {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.chorus.prepare(spec.sample_rate, spec.num_channels);
    }

    fn reset(&mut self) {
        self.chorus.reset();
    }

    fn prepared_channels(&self) -> Option<usize> {
        Some(self.chorus.num_channels())
    }

    fn process(&mut self, buffer: &mut AudioBuffer, num_samples: usize) {
        debug_check_channels(buffer, self.chorus.num_channels());
        let len = block_len(buffer, num_samples);
        self.chorus
            .process(buffer.channels_mut().map(|channel| &mut channel[..len]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::ParamRules;

    #[test]
    fn test_fixed_settings() {
        let chorus = ChorusEffect::new();
        assert_eq!(chorus.name(), "chorus");
        assert_eq!(chorus.settings(), CHORUS_SETTINGS);
        assert_eq!(chorus.rules(), ParamRules::Open);
    }

    #[test]
    fn test_parameters_are_stored_but_not_applied() {
        let mut chorus = ChorusEffect::new();
        assert_eq!(chorus.get_parameter("rate"), None);

        chorus.set_parameter("Rate", 99.0);

        assert_eq!(chorus.get_parameter("rate"), Some(99.0));
        assert_eq!(chorus.settings().rate, 1.5);
    }

    #[test]
    fn test_process_changes_signal_in_place() {
        let mut chorus = ChorusEffect::new();
        let input: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.07).sin() * 0.5).collect();
        let mut buffer = AudioBuffer::from_channels(vec![input.clone(), input.clone()]);

        chorus.process(&mut buffer, 1024);

        // Before the wet path arrives the output is the dry half of the mix
        assert!((buffer.channel(0)[10] - input[10] * 0.5).abs() < 1e-6);
        assert_ne!(buffer.channel(0), input.as_slice());
        assert_eq!(buffer.channel(0), buffer.channel(1));
    }
}
