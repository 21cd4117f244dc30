use std::any::Any;

/// Describes something a voice can play, and which notes/channels it covers.
///
/// Voices decide whether they support a sound by inspecting its concrete type
/// through [`Sound::as_any`].
pub trait Sound: Any + Send + Sync {
    fn applies_to_note(&self, note: u8) -> bool;

    fn applies_to_channel(&self, channel: u8) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// The square-wave sound: every note, every channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareWaveSound;

impl Sound for SquareWaveSound {
    fn applies_to_note(&self, _note: u8) -> bool {
        true
    }

    fn applies_to_channel(&self, _channel: u8) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
