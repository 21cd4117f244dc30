use std::sync::Arc;

use rtrb::{Producer, RingBuffer};

use crate::buffer::{AudioBuffer, BufferError};
use crate::synth::message::{MessageReceiver, SynthMessage};
use crate::synth::sound::Sound;
use crate::synth::voice::Voice;

/*
Synthesiser
===========

A bank of voices plus the sounds they can play.

Note-on
-------

    1. Pick the first sound that applies to the note AND the channel.
    2. Any voice already playing that note/channel/sound is released (with
       tail) so a retriggered key does not stack.
    3. Start the note on the first idle voice that can play the sound.
    4. No idle voice: steal one (if stealing is enabled), preferring the
       oldest releasing voice, then the oldest voice overall.

Note-off only touches voices whose note AND channel match.

Messages queued through `message_queue` are applied at the start of
`render_next_block`, before any voice renders.
*/

struct VoiceSlot {
    voice: Box<dyn Voice>,
    channel: u8,
    sound: Option<usize>,
    started_at: u64,
}

impl VoiceSlot {
    fn is_playing(&self, channel: u8, note: u8) -> bool {
        self.channel == channel && self.voice.current_note() == Some(note)
    }
}

pub struct Synthesiser {
    voices: Vec<VoiceSlot>,
    sounds: Vec<Arc<dyn Sound>>,
    sample_rate: f64,
    voice_stealing: bool,
    note_counter: u64,
    rx: Option<Box<dyn MessageReceiver>>,
}

impl Synthesiser {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            sounds: Vec::new(),
            sample_rate: 0.0,
            voice_stealing: true,
            note_counter: 0,
            rx: None,
        }
    }

    /// Builder-style voice registration.
    pub fn with_voice(mut self, voice: impl Voice + 'static) -> Self {
        self.add_voice(Box::new(voice));
        self
    }

    pub fn with_sound(mut self, sound: impl Sound) -> Self {
        self.add_sound(Arc::new(sound));
        self
    }

    pub fn with_voice_stealing(mut self, enabled: bool) -> Self {
        self.voice_stealing = enabled;
        self
    }

    pub fn add_voice(&mut self, mut voice: Box<dyn Voice>) {
        if self.sample_rate > 0.0 {
            voice.prepare(self.sample_rate);
        }
        self.voices.push(VoiceSlot {
            voice,
            channel: 0,
            sound: None,
            started_at: 0,
        });
    }

    pub fn add_sound(&mut self, sound: Arc<dyn Sound>) {
        self.sounds.push(sound);
    }

    pub fn clear_voices(&mut self) {
        self.voices.clear();
    }

    pub fn clear_sounds(&mut self) {
        self.all_notes_off(None, false);
        self.sounds.clear();
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn num_sounds(&self) -> usize {
        self.sounds.len()
    }

    /// Number of voices currently sounding or releasing.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|s| s.voice.is_active()).count()
    }

    pub fn voice(&self, index: usize) -> Option<&dyn Voice> {
        self.voices.get(index).map(|slot| slot.voice.as_ref())
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Create the control queue. The returned producer belongs to whichever
    /// thread sends notes; messages are drained at the start of every block.
    pub fn message_queue(&mut self, capacity: usize) -> Producer<SynthMessage> {
        let (tx, rx) = RingBuffer::new(capacity);
        self.rx = Some(Box::new(rx));
        tx
    }

    pub fn set_message_receiver(&mut self, rx: impl MessageReceiver + 'static) {
        self.rx = Some(Box::new(rx));
    }

    /// Changing the rate stops every note without a tail.
    pub fn set_current_playback_sample_rate(&mut self, sample_rate: f64) {
        if self.sample_rate == sample_rate {
            return;
        }
        self.all_notes_off(None, false);
        self.sample_rate = sample_rate;
        for slot in &mut self.voices {
            slot.voice.prepare(sample_rate);
        }
        tracing::debug!(sample_rate, voices = self.voices.len(), "synthesiser prepared");
    }

    pub fn note_on(&mut self, channel: u8, note: u8, velocity: f32) {
        let Some(sound_idx) = self
            .sounds
            .iter()
            .position(|s| s.applies_to_note(note) && s.applies_to_channel(channel))
        else {
            tracing::warn!(channel, note, "no sound applies to note");
            return;
        };

        for slot in &mut self.voices {
            if slot.sound == Some(sound_idx) && slot.is_playing(channel, note) {
                slot.voice.note_off(1.0, true);
            }
        }

        let Some(idx) = self.find_voice_for(sound_idx) else {
            tracing::warn!(channel, note, "no voice available for note");
            return;
        };

        self.note_counter += 1;
        let slot = &mut self.voices[idx];
        slot.channel = channel;
        slot.sound = Some(sound_idx);
        slot.started_at = self.note_counter;
        slot.voice.note_on(note, velocity);
    }

    pub fn note_off(&mut self, channel: u8, note: u8, velocity: f32, allow_tail_off: bool) {
        for slot in &mut self.voices {
            if slot.is_playing(channel, note) {
                slot.voice.note_off(velocity, allow_tail_off);
            }
        }
    }

    pub fn all_notes_off(&mut self, channel: Option<u8>, allow_tail_off: bool) {
        for slot in &mut self.voices {
            if channel.map_or(true, |c| c == slot.channel) && slot.voice.is_active() {
                slot.voice.note_off(1.0, allow_tail_off);
            }
        }
    }

    pub fn handle_pitch_wheel(&mut self, channel: u8, value: u16) {
        for slot in &mut self.voices {
            if slot.channel == channel && slot.voice.is_active() {
                slot.voice.pitch_wheel_moved(value);
            }
        }
    }

    pub fn handle_controller(&mut self, channel: u8, controller: u8, value: u8) {
        for slot in &mut self.voices {
            if slot.channel == channel && slot.voice.is_active() {
                slot.voice.controller_moved(controller, value);
            }
        }
    }

    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            SynthMessage::NoteOff {
                channel,
                note,
                velocity,
                allow_tail_off,
            } => self.note_off(channel, note, velocity, allow_tail_off),
            SynthMessage::AllNotesOff {
                channel,
                allow_tail_off,
            } => self.all_notes_off(channel, allow_tail_off),
            SynthMessage::PitchWheel { channel, value } => self.handle_pitch_wheel(channel, value),
            SynthMessage::Controller {
                channel,
                controller,
                value,
            } => self.handle_controller(channel, controller, value),
        }
    }

    /// Apply queued messages, then add every active voice into
    /// `buffer[start..start + num_samples]`. The region is summed into, not
    /// cleared.
    pub fn render_next_block(
        &mut self,
        buffer: &mut AudioBuffer,
        start: usize,
        num_samples: usize,
    ) -> Result<(), BufferError> {
        buffer.check_region(start, num_samples)?;

        while let Some(msg) = self.rx.as_mut().and_then(|rx| rx.pop()) {
            self.handle_message(msg);
        }

        for slot in &mut self.voices {
            if slot.voice.is_active() {
                slot.voice.render(buffer, start, num_samples);
            }
        }
        Ok(())
    }

    fn find_voice_for(&self, sound_idx: usize) -> Option<usize> {
        let sound = self.sounds[sound_idx].as_ref();

        // First pass: idle voice that supports the sound
        if let Some(idx) = self
            .voices
            .iter()
            .position(|s| !s.voice.is_active() && s.voice.can_play(sound))
        {
            return Some(idx);
        }

        if !self.voice_stealing {
            return None;
        }

        // Second pass: steal, releasing voices first, oldest first
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, s)| s.voice.can_play(sound))
            .min_by_key(|(_, s)| (!s.voice.is_releasing(), s.started_at))
            .map(|(idx, _)| idx)
    }
}

impl Default for Synthesiser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::sound::SquareWaveSound;
    use crate::synth::voice::SquareWaveVoice;

    fn synth(voices: usize) -> Synthesiser {
        let mut synth = Synthesiser::new().with_sound(SquareWaveSound);
        for _ in 0..voices {
            synth = synth.with_voice(SquareWaveVoice::new());
        }
        synth.set_current_playback_sample_rate(44_100.0);
        synth
    }

    #[test]
    fn test_note_on_renders_into_buffer() {
        let mut synth = synth(1);
        synth.note_on(1, 60, 0.8);

        let mut buffer = AudioBuffer::new(2, 512);
        synth.render_next_block(&mut buffer, 0, 512).unwrap();

        assert_eq!(synth.active_voices(), 1);
        assert!((buffer.peak() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_no_sound_means_silence() {
        let mut synth = Synthesiser::new().with_voice(SquareWaveVoice::new());
        synth.set_current_playback_sample_rate(44_100.0);
        synth.note_on(1, 60, 0.8);

        let mut buffer = AudioBuffer::new(1, 64);
        synth.render_next_block(&mut buffer, 0, 64).unwrap();

        assert_eq!(synth.active_voices(), 0);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_voices_sum_into_buffer() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.25);
        synth.note_on(1, 67, 0.25);

        let mut buffer = AudioBuffer::new(1, 64);
        synth.render_next_block(&mut buffer, 0, 64).unwrap();

        assert_eq!(synth.active_voices(), 2);
        // Both voices start at phase 0 with -level
        assert!((buffer.channel(0)[0] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_note_off_matches_channel_and_note() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.5);
        synth.note_on(2, 60, 0.5);

        synth.note_off(1, 60, 0.0, false);

        assert_eq!(synth.active_voices(), 1);
        assert_eq!(synth.voice(1).and_then(|v| v.current_note()), Some(60));

        synth.note_off(2, 61, 0.0, false);
        assert_eq!(synth.active_voices(), 1);
    }

    #[test]
    fn test_all_notes_off_without_tail_silences() {
        let mut synth = synth(4);
        for note in [60, 64, 67] {
            synth.note_on(1, note, 0.5);
        }

        synth.all_notes_off(None, false);

        let mut buffer = AudioBuffer::new(1, 64);
        synth.render_next_block(&mut buffer, 0, 64).unwrap();
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_steals_oldest_voice_when_full() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.5);
        synth.note_on(1, 62, 0.5);
        synth.note_on(1, 64, 0.5);

        let notes: Vec<_> = (0..2)
            .filter_map(|i| synth.voice(i).and_then(|v| v.current_note()))
            .collect();
        assert_eq!(notes, vec![64, 62]);
    }

    #[test]
    fn test_steals_releasing_voice_first() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.5);
        synth.note_on(1, 62, 0.5);
        synth.note_off(1, 62, 0.0, true);

        synth.note_on(1, 64, 0.5);

        let notes: Vec<_> = (0..2)
            .filter_map(|i| synth.voice(i).and_then(|v| v.current_note()))
            .collect();
        assert_eq!(notes, vec![60, 64]);
    }

    #[test]
    fn test_no_stealing_drops_note() {
        let mut synth = synth(1).with_voice_stealing(false);
        synth.note_on(1, 60, 0.5);
        synth.note_on(1, 62, 0.5);

        assert_eq!(synth.voice(0).and_then(|v| v.current_note()), Some(60));
    }

    #[test]
    fn test_queued_messages_apply_before_render() {
        let mut synth = synth(1);
        let mut tx = synth.message_queue(8);
        tx.push(SynthMessage::NoteOn {
            channel: 1,
            note: 69,
            velocity: 0.5,
        })
        .unwrap();

        let mut buffer = AudioBuffer::new(1, 32);
        synth.render_next_block(&mut buffer, 0, 32).unwrap();
        assert!((buffer.peak() - 0.5).abs() < 1e-6);

        tx.push(SynthMessage::AllNotesOff {
            channel: Some(1),
            allow_tail_off: false,
        })
        .unwrap();
        buffer.clear();
        synth.render_next_block(&mut buffer, 0, 32).unwrap();
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_render_rejects_region_outside_buffer() {
        let mut synth = synth(1);
        let mut buffer = AudioBuffer::new(1, 32);

        assert!(synth.render_next_block(&mut buffer, 16, 32).is_err());
        assert!(synth.render_next_block(&mut buffer, 16, 16).is_ok());
    }

    #[test]
    fn test_retrigger_releases_previous_voice() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.5);
        synth.note_on(1, 60, 0.5);

        let releasing = (0..2)
            .filter(|&i| synth.voice(i).is_some_and(|v| v.is_releasing()))
            .count();
        let sounding = (0..2)
            .filter(|&i| {
                synth
                    .voice(i)
                    .is_some_and(|v| !v.is_releasing() && v.current_note() == Some(60))
            })
            .count();
        assert_eq!((releasing, sounding), (1, 1));

        synth.note_off(1, 60, 0.0, true);
        let mut buffer = AudioBuffer::new(1, 1024);
        synth.render_next_block(&mut buffer, 0, 1024).unwrap();
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_clear_sounds_silences_and_blocks_new_notes() {
        let mut synth = synth(2);
        synth.note_on(1, 60, 0.5);
        synth.clear_sounds();

        assert_eq!(synth.num_sounds(), 0);
        assert_eq!(synth.active_voices(), 0);
        synth.note_on(1, 62, 0.5);
        assert_eq!(synth.active_voices(), 0);

        synth.clear_voices();
        assert_eq!(synth.num_voices(), 0);
    }

    #[test]
    fn test_custom_message_receiver() {
        struct Scripted(Vec<SynthMessage>);
        impl MessageReceiver for Scripted {
            fn pop(&mut self) -> Option<SynthMessage> {
                self.0.pop()
            }
        }

        let mut synth = synth(1);
        synth.set_message_receiver(Scripted(vec![SynthMessage::NoteOn {
            channel: 1,
            note: 72,
            velocity: 0.5,
        }]));

        let mut buffer = AudioBuffer::new(1, 16);
        synth.render_next_block(&mut buffer, 0, 16).unwrap();
        assert_eq!(synth.voice(0).and_then(|v| v.current_note()), Some(72));
    }

    #[test]
    fn test_sample_rate_change_stops_notes() {
        let mut synth = synth(1);
        synth.note_on(1, 60, 0.5);

        synth.set_current_playback_sample_rate(48_000.0);

        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.sample_rate(), 48_000.0);
    }
}
