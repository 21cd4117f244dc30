//! Voice management: sounds, the square-wave voice, and the polyphonic
//! synthesiser that owns them.

pub mod message;
pub mod sound;
pub mod synthesiser;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use sound::{Sound, SquareWaveSound};
pub use synthesiser::Synthesiser;
pub use voice::{SquareWaveVoice, Voice, VoiceState};
