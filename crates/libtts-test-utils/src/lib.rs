//! Mock plugins and engines shared by the libtts integration tests.

mod kokoro;
mod tone;

pub use kokoro::{MockKokoroLoader, MockKokoroModel};
pub use tone::{MockTonePlugin, TONE_SAMPLE_RATE, ToneEngine, ToneError, ToneSession, ToneSettings};
