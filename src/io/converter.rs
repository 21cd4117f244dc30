use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Controller 123: all notes off.
const ALL_NOTES_OFF_CC: u8 = 123;

/// Scale a 7-bit MIDI velocity into `[0, 1]`.
pub fn velocity_to_gain(velocity: u8) -> f32 {
    velocity.min(127) as f32 / 127.0
}

/// Translate a MIDI event into a synthesiser message.
///
/// `channel_filter` drops events from other channels. A note-on with
/// velocity 0 is a note-off, and note-offs always release with a tail.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: Option<u8>) -> Option<SynthMessage> {
    if channel_filter.is_some_and(|c| c != midi.channel()) {
        return None;
    }

    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        } => Some(note_off(channel, key, 0)),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } => Some(note_off(channel, key, velocity)),
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } => Some(SynthMessage::NoteOn {
            channel,
            note: key,
            velocity: velocity_to_gain(velocity),
        }),
        MidiEvent::ControlChange {
            channel,
            controller: ALL_NOTES_OFF_CC,
            ..
        } => Some(SynthMessage::AllNotesOff {
            channel: Some(channel),
            allow_tail_off: true,
        }),
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } => Some(SynthMessage::Controller {
            channel,
            controller,
            value,
        }),
        MidiEvent::PitchBend { channel, value } => Some(SynthMessage::PitchWheel {
            channel,
            value: (value.clamp(-8192, 8191) + 8192) as u16,
        }),
        MidiEvent::ProgramChange { .. } => None,
    }
}

fn note_off(channel: u8, note: u8, velocity: u8) -> SynthMessage {
    SynthMessage::NoteOff {
        channel,
        note,
        velocity: velocity_to_gain(velocity),
        allow_tail_off: true,
    }
}
