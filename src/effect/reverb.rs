use crate::buffer::AudioBuffer;
use crate::dsp::reverb::{FreeverbTank, ReverbParameters};
use crate::effect::{block_len, debug_check_channels, Effect, EffectCore, ParamRange, ParamRules, ProcessSpec};

/*
Reverb Effect
=============

Wraps the Freeverb tank with a validated, named control surface. Six controls
are recognised (names are case-insensitive):

  roomSize    0.0 small room .. 1.0 large hall (comb feedback)
  damping     0.0 bright     .. 1.0 dark
  wetLevel    reverberated signal level
  dryLevel    direct signal level
  width       0.0 mono tail  .. 1.0 full stereo tail
  freezeMode  >= 0.5 holds the current tail indefinitely

Every value is clamped to [0, 1]. The clamped value is what reaches the tank
AND what is stored, so `get_parameter` always reports what is actually
playing. Unknown names are rejected with a warning and change nothing.

Channel handling: channels are processed as stereo pairs (0/1, 2/3, ...), a
trailing odd channel runs through a mono tank. The buffer must not carry more
channels than `prepare` was given; `EffectPipeline::process` rejects it.
*/

/// The recognised reverb controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverbParam {
    RoomSize,
    Damping,
    WetLevel,
    DryLevel,
    Width,
    FreezeMode,
}

const REVERB_RANGES: [ParamRange; 6] = [
    ParamRange { name: "roomsize", min: 0.0, max: 1.0 },
    ParamRange { name: "damping", min: 0.0, max: 1.0 },
    ParamRange { name: "wetlevel", min: 0.0, max: 1.0 },
    ParamRange { name: "drylevel", min: 0.0, max: 1.0 },
    ParamRange { name: "width", min: 0.0, max: 1.0 },
    ParamRange { name: "freezemode", min: 0.0, max: 1.0 },
];

impl ReverbParam {
    pub const ALL: [ReverbParam; 6] = [
        ReverbParam::RoomSize,
        ReverbParam::Damping,
        ReverbParam::WetLevel,
        ReverbParam::DryLevel,
        ReverbParam::Width,
        ReverbParam::FreezeMode,
    ];

    fn range(self) -> &'static ParamRange {
        &REVERB_RANGES[self as usize]
    }

    /// Lower-cased parameter name.
    pub fn name(self) -> &'static str {
        self.range().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|param| param.name().eq_ignore_ascii_case(name))
    }

    /// Read this control out of a parameter struct.
    pub fn get(self, params: &ReverbParameters) -> f32 {
        match self {
            ReverbParam::RoomSize => params.room_size,
            ReverbParam::Damping => params.damping,
            ReverbParam::WetLevel => params.wet_level,
            ReverbParam::DryLevel => params.dry_level,
            ReverbParam::Width => params.width,
            ReverbParam::FreezeMode => params.freeze_mode,
        }
    }

    fn set(self, params: &mut ReverbParameters, value: f32) {
        match self {
            ReverbParam::RoomSize => params.room_size = value,
            ReverbParam::Damping => params.damping = value,
            ReverbParam::WetLevel => params.wet_level = value,
            ReverbParam::DryLevel => params.dry_level = value,
            ReverbParam::Width => params.width = value,
            ReverbParam::FreezeMode => params.freeze_mode = value,
        }
    }
}

/// Settings applied by [`ReverbEffect::new`].
pub const DEFAULT_REVERB: ReverbParameters = ReverbParameters {
    room_size: 0.8,
    damping: 0.5,
    wet_level: 0.3,
    dry_level: 0.7,
    width: 1.0,
    freeze_mode: 0.0,
};

pub struct ReverbEffect {
    core: EffectCore,
    params: ReverbParameters,
    tanks: Vec<FreeverbTank>,
    channels: usize,
}

impl ReverbEffect {
    /// Stereo reverb at 44.1kHz with the default settings.
    pub fn new() -> Self {
        Self::with_spec(&ProcessSpec::default())
    }

    pub fn with_spec(spec: &ProcessSpec) -> Self {
        let mut reverb = Self {
            core: EffectCore::new("Reverb"),
            params: ReverbParameters::default(),
            tanks: Vec::new(),
            channels: 0,
        };
        reverb.prepare(spec);

        for param in ReverbParam::ALL {
            reverb.set_parameter(param.name(), param.get(&DEFAULT_REVERB));
        }
        reverb
    }

    /// The parameter struct currently driving the DSP.
    pub fn reverb_parameters(&self) -> ReverbParameters {
        self.params
    }

    /// Replace the whole parameter struct in every tank.
    fn apply(&mut self, params: ReverbParameters) {
        self.params = params;
        for tank in &mut self.tanks {
            tank.set_parameters(params);
        }
    }
}

impl Default for ReverbEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for ReverbEffect {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.channels = spec.num_channels;
        let needed = spec.num_channels.div_ceil(2).max(1);
        if self.tanks.len() != needed {
            self.tanks = (0..needed)
                .map(|_| FreeverbTank::new(spec.sample_rate))
                .collect();
        }
        for tank in &mut self.tanks {
            tank.set_sample_rate(spec.sample_rate);
            tank.set_parameters(self.params);
            tank.reset();
        }
        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels = spec.num_channels,
            "reverb prepared"
        );
    }

    fn reset(&mut self) {
        self.tanks.iter_mut().for_each(FreeverbTank::reset);
    }

    fn prepared_channels(&self) -> Option<usize> {
        Some(self.channels)
    }

    fn process(&mut self, buffer: &mut AudioBuffer, num_samples: usize) {
        debug_check_channels(buffer, self.channels);
        let len = block_len(buffer, num_samples);
        let channels = buffer.num_channels();

        for (pair, tank) in self.tanks.iter_mut().enumerate() {
            let left = pair * 2;
            let right = left + 1;
            if right < channels {
                let (l, r) = buffer.channel_pair_mut(left, right);
                tank.process_stereo(&mut l[..len], &mut r[..len]);
            } else if left < channels {
                tank.process_mono(&mut buffer.channel_mut(left)[..len]);
            }
        }
    }

    fn set_parameter(&mut self, name: &str, value: f32) {
        let Some(param) = ReverbParam::from_name(name) else {
            tracing::warn!(
                effect = self.core.name(),
                parameter = name,
                "attempted to set unknown parameter"
            );
            return;
        };

        let value = param.range().clamp(value);
        let mut params = self.params;
        param.set(&mut params, value);
        self.apply(params);

        self.core.parameters_mut().set(param.name(), value);
    }

    fn rules(&self) -> ParamRules {
        ParamRules::Bounded(&REVERB_RANGES)
    }
}
