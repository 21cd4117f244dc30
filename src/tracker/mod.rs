/*
Tracker Data Model
==================

The song structure a tracker edits, in the shape the audio core consumes:

    Tracker
    ├── instruments: [Instrument]        (name + effect chain)
    └── patterns:    [Pattern]
                       └── rows: [PatternRow]
                                   └── steps: [PatternStep]
                                                ├── note:       Option<Note>
                                                └── instrument: Option<InstrumentId>

Patterns and instruments live in arenas owned by the `Tracker` and are
referenced by index (`PatternId`, `InstrumentId`). A step never owns its
instrument, so one instrument is shared by any number of steps.

Nothing here schedules playback. A step's note becomes a `SynthMessage`
through `Note::to_note_on`, and an instrument's effect chain becomes an
`EffectPipeline` through `Instrument::build_pipeline`.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::effect::{ChorusEffect, Effect, EffectPipeline, ProcessSpec, ReverbEffect};
use crate::synth::SynthMessage;

/// A pitch (MIDI note number) and a velocity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    pub pitch: u8,
    pub velocity: f32,
}

impl Note {
    pub fn new(pitch: u8, velocity: f32) -> Self {
        Self { pitch, velocity }
    }

    /// The message that starts this note on `channel`.
    pub fn to_note_on(&self, channel: u8) -> SynthMessage {
        SynthMessage::NoteOn {
            channel,
            note: self.pitch,
            velocity: self.velocity,
        }
    }

    /// The matching release, with tail.
    pub fn to_note_off(&self, channel: u8) -> SynthMessage {
        SynthMessage::NoteOff {
            channel,
            note: self.pitch,
            velocity: 0.0,
            allow_tail_off: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstrumentId(pub usize);

/// One cell of a row. Both halves are optional: an empty step is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternStep {
    pub note: Option<Note>,
    pub instrument: Option<InstrumentId>,
}

impl PatternStep {
    pub fn new(note: Note, instrument: InstrumentId) -> Self {
        Self {
            note: Some(note),
            instrument: Some(instrument),
        }
    }

    pub fn rest() -> Self {
        Self::default()
    }

    pub fn is_rest(&self) -> bool {
        self.note.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternRow {
    pub steps: Vec<PatternStep>,
}

impl PatternRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: PatternStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn add_step(&mut self, step: PatternStep) {
        self.steps.push(step);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pattern {
    pub rows: Vec<PatternRow>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, row: PatternRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn add_row(&mut self, row: PatternRow) {
        self.rows.push(row);
    }
}

/// Effect units an instrument can chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EffectKind {
    Reverb,
    Chorus,
}

impl EffectKind {
    pub fn build(self, spec: &ProcessSpec) -> Box<dyn Effect> {
        match self {
            EffectKind::Reverb => Box::new(ReverbEffect::with_spec(spec)),
            EffectKind::Chorus => Box::new(ChorusEffect::with_spec(spec)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instrument {
    pub name: String,
    pub effects: Vec<EffectKind>,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, kind: EffectKind) -> Self {
        self.effects.push(kind);
        self
    }

    pub fn add_effect(&mut self, kind: EffectKind) {
        self.effects.push(kind);
    }

    /// A fresh pipeline running this instrument's effects in order.
    pub fn build_pipeline(&self, spec: &ProcessSpec) -> EffectPipeline {
        let mut pipeline = EffectPipeline::new();
        for kind in &self.effects {
            pipeline.push(kind.build(spec));
        }
        pipeline
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tracker {
    patterns: Vec<Pattern>,
    instruments: Vec<Instrument>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&mut self, pattern: Pattern) -> PatternId {
        self.patterns.push(pattern);
        PatternId(self.patterns.len() - 1)
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> InstrumentId {
        self.instruments.push(instrument);
        InstrumentId(self.instruments.len() - 1)
    }

    pub fn pattern(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(id.0)
    }

    pub fn pattern_mut(&mut self, id: PatternId) -> Option<&mut Pattern> {
        self.patterns.get_mut(id.0)
    }

    pub fn instrument(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id.0)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Resolve a step's instrument. A dangling id resolves to `None`.
    pub fn instrument_for(&self, step: &PatternStep) -> Option<&Instrument> {
        step.instrument.and_then(|id| self.instrument(id))
    }
}
