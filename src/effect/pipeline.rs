//! Ordered effect chain plus the control-thread hand-off.
//!
//! The audio thread owns [`EffectPipeline`]; the UI/control thread owns the
//! [`PipelineControl`] returned by [`EffectPipeline::attach_control`]. They
//! share nothing but a wait-free SPSC ring of [`ParamChange`] messages:
//!
//! ```text
//!  control thread                          audio thread
//!  ──────────────                          ────────────
//!  set_parameter(slot, "wetLevel", 0.4)
//!    ├─ validate against mirrored rules
//!    ├─ update mirrored store
//!    └─ push ParamChange ──── rtrb ────→  process(buffer, n)
//!                                            ├─ drain ring, set_parameter on live effect
//!                                            └─ run effects in order
//! ```
//!
//! The control side keeps a mirror of each effect's name, validation rules
//! and parameter store, so `get_parameter` answers immediately and agrees
//! with what the audio thread will apply.

use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::buffer::{AudioBuffer, BufferError};
use crate::effect::{Effect, ParamRules, ParameterStore, ProcessSpec};

/// Longest parameter name that can cross the thread boundary.
pub const MAX_PARAM_NAME_LEN: usize = 32;

/// Lower-cased parameter name stored inline, so messages never allocate.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParamKey {
    bytes: [u8; MAX_PARAM_NAME_LEN],
    len: u8,
}

impl ParamKey {
    /// `None` if `name` is longer than [`MAX_PARAM_NAME_LEN`] bytes.
    pub fn new(name: &str) -> Option<Self> {
        if name.len() > MAX_PARAM_NAME_LEN {
            return None;
        }
        let mut bytes = [0u8; MAX_PARAM_NAME_LEN];
        for (dst, src) in bytes.iter_mut().zip(name.bytes()) {
            *dst = src.to_ascii_lowercase();
        }
        Some(Self {
            bytes,
            len: name.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // ASCII folding keeps the bytes valid UTF-8
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl std::fmt::Debug for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ParamKey").field(&self.as_str()).finish()
    }
}

/// One validated parameter write on its way to the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub slot: usize,
    pub key: ParamKey,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("no effect in slot {0}")]
    UnknownEffect(usize),
    #[error("effect '{effect}' has no parameter '{parameter}'")]
    UnknownParameter { effect: String, parameter: String },
    #[error("parameter name '{0}' exceeds {max} bytes", max = MAX_PARAM_NAME_LEN)]
    NameTooLong(String),
    #[error("parameter queue is full")]
    QueueFull,
}

/// Effects applied in insertion order, in place, once per block.
#[derive(Default)]
pub struct EffectPipeline {
    effects: Vec<Box<dyn Effect>>,
    rx: Option<Consumer<ParamChange>>,
}

impl EffectPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect; returns its slot index.
    pub fn push(&mut self, effect: Box<dyn Effect>) -> usize {
        self.effects.push(effect);
        self.effects.len() - 1
    }

    /// Builder form of [`EffectPipeline::push`].
    pub fn with(mut self, effect: impl Effect + 'static) -> Self {
        self.push(Box::new(effect));
        self
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effect(&self, slot: usize) -> Option<&dyn Effect> {
        self.effects.get(slot).map(|effect| effect.as_ref())
    }

    pub fn effect_mut(&mut self, slot: usize) -> Option<&mut (dyn Effect + 'static)> {
        self.effects.get_mut(slot).map(|effect| effect.as_mut())
    }

    /// Prepare every effect for a host format. May allocate.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        for effect in &mut self.effects {
            effect.prepare(spec);
        }
    }

    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Create the control-thread handle for the effects pushed so far.
    ///
    /// Effects pushed afterwards are not reachable from the returned handle.
    /// Attaching again replaces the previous hand-off.
    ///
    /// Effects with open rules get their parameter table reserved for
    /// `capacity` new names, so the table itself does not grow on the audio
    /// thread. The lower-cased key of a name seen for the first time is still
    /// allocated there.
    pub fn attach_control(&mut self, capacity: usize) -> PipelineControl {
        let (tx, rx) = RingBuffer::new(capacity);
        self.rx = Some(rx);

        for effect in &mut self.effects {
            if effect.rules() == ParamRules::Open {
                effect.core_mut().parameters_mut().reserve(capacity);
            }
        }

        let mirrors = self
            .effects
            .iter()
            .map(|effect| Mirror {
                name: effect.name().to_owned(),
                rules: effect.rules(),
                store: effect.parameters().clone(),
            })
            .collect();

        PipelineControl { tx, mirrors }
    }

    /// Apply every queued parameter change. Returns how many were applied.
    ///
    /// Runs on the audio thread. Updating a known name is allocation-free;
    /// see [`EffectPipeline::attach_control`] for first-time names.
    pub fn apply_pending(&mut self) -> usize {
        let Some(rx) = self.rx.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        while let Ok(change) = rx.pop() {
            if let Some(effect) = self.effects.get_mut(change.slot) {
                effect.set_parameter(change.key.as_str(), change.value);
                applied += 1;
            }
        }
        applied
    }

    /// Fewest channels any effect was prepared for.
    pub fn prepared_channels(&self) -> Option<usize> {
        self.effects
            .iter()
            .filter_map(|effect| effect.prepared_channels())
            .min()
    }

    /// Apply pending control changes, then run every effect over the first
    /// `num_samples` frames of `buffer`.
    ///
    /// Fails without touching the buffer when the region is out of range or
    /// the buffer has more channels than the effects were prepared for.
    pub fn process(&mut self, buffer: &mut AudioBuffer, num_samples: usize) -> Result<(), BufferError> {
        self.apply_pending();
        buffer.check_region(0, num_samples)?;
        if let Some(prepared) = self.prepared_channels() {
            if buffer.num_channels() > prepared {
                return Err(BufferError::ChannelMismatch {
                    prepared,
                    got: buffer.num_channels(),
                });
            }
        }

        for effect in &mut self.effects {
            effect.process(buffer, num_samples);
        }
        Ok(())
    }
}

struct Mirror {
    name: String,
    rules: ParamRules,
    store: ParameterStore,
}

/// Control-thread view of an [`EffectPipeline`].
pub struct PipelineControl {
    tx: Producer<ParamChange>,
    mirrors: Vec<Mirror>,
}

impl PipelineControl {
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Slot of the first effect called `name` (case-insensitive).
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.mirrors
            .iter()
            .position(|mirror| mirror.name.eq_ignore_ascii_case(name))
    }

    /// Validate, record and forward a parameter write.
    ///
    /// Returns the value the effect will actually use (clamped for effects
    /// with bounded controls).
    pub fn set_parameter(&mut self, slot: usize, name: &str, value: f32) -> Result<f32, ControlError> {
        let mirror = self
            .mirrors
            .get_mut(slot)
            .ok_or(ControlError::UnknownEffect(slot))?;

        let Some(value) = mirror.rules.resolve(name, value) else {
            tracing::warn!(
                effect = mirror.name.as_str(),
                parameter = name,
                "attempted to set unknown parameter"
            );
            return Err(ControlError::UnknownParameter {
                effect: mirror.name.clone(),
                parameter: name.to_owned(),
            });
        };

        let key = ParamKey::new(name).ok_or_else(|| ControlError::NameTooLong(name.to_owned()))?;
        self.tx
            .push(ParamChange { slot, key, value })
            .map_err(|_| ControlError::QueueFull)?;

        mirror.store.set(name, value);
        Ok(value)
    }

    /// Last value written for `name` on the effect in `slot`.
    pub fn get_parameter(&self, slot: usize, name: &str) -> Option<f32> {
        self.mirrors.get(slot)?.store.get(name)
    }
}
