use rtrb::Consumer;

/// Control messages sent to a [`Synthesiser`](super::Synthesiser) from
/// outside the audio thread. They are applied at the start of the next block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: f32,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: f32,
        allow_tail_off: bool,
    },
    /// `channel: None` addresses every channel.
    AllNotesOff {
        channel: Option<u8>,
        allow_tail_off: bool,
    },
    PitchWheel {
        channel: u8,
        value: u16,
    },
    Controller {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

pub trait MessageReceiver: Send {
    fn pop(&mut self) -> Option<SynthMessage>;
}

impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
