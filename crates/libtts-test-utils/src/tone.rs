use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use libtts::{
    AudioSpec, Catalogue, Chunks, EngineBackend, PluginDescriptor, PluginId, Settings,
    SettingsModel, SpeechEngine, TTSBackend, TTSPlugin, TTSResult,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TONE_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum ToneError {
    #[error("Tone error: {0}")]
    ToneError(String),
}

/// Settings of the mock tone engine. The failure switches let tests drive a
/// backend into its error paths through ordinary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ToneSettings {
    #[schemars(title = "Frequency", description = "Pitch of the generated tone in hertz.")]
    #[schemars(range(min = 50, max = 4000))]
    pub frequency_hz: u32,

    #[schemars(title = "Chunk Length", description = "Audio length of one word in milliseconds.")]
    #[schemars(range(min = 10, max = 1000))]
    pub chunk_ms: u32,

    #[schemars(range(max = 1000))]
    pub delay_ms: u32,

    pub fail_on_start: bool,

    pub fail_at_chunk: Option<u32>,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 440,
            chunk_ms: 20,
            delay_ms: 0,
            fail_on_start: false,
            fail_at_chunk: None,
        }
    }
}

impl SettingsModel for ToneSettings {}

/// Loaded tone; counted as live until dropped.
pub struct ToneSession {
    tone: Bytes,
    live: Arc<AtomicUsize>,
}

impl Drop for ToneSession {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Emits one sine tone chunk per word of the input.
pub struct ToneEngine {
    produced: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl ToneEngine {
    fn tone(settings: &ToneSettings) -> Bytes {
        let samples = (TONE_SAMPLE_RATE * settings.chunk_ms / 1000) as usize;
        let step = std::f32::consts::TAU * settings.frequency_hz as f32 / TONE_SAMPLE_RATE as f32;
        let mut buf = BytesMut::with_capacity(samples * 2);
        for n in 0..samples {
            buf.put_i16_le(((n as f32 * step).sin() * 0.5 * i16::MAX as f32) as i16);
        }
        buf.freeze()
    }
}

#[async_trait]
impl SpeechEngine for ToneEngine {
    type Settings = ToneSettings;
    type Session = ToneSession;
    type Error = ToneError;

    fn audio_spec(&self) -> AudioSpec {
        AudioSpec::pcm_s16le_mono(TONE_SAMPLE_RATE)
    }

    async fn load(&self, settings: &ToneSettings) -> Result<ToneSession, ToneError> {
        if settings.fail_on_start {
            return Err(ToneError::ToneError("tone generator unavailable".to_string()));
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(ToneSession {
            tone: Self::tone(settings),
            live: Arc::clone(&self.live),
        })
    }

    fn synthesize<'a>(
        &'a self,
        session: &'a ToneSession,
        settings: &'a ToneSettings,
        text: &'a str,
    ) -> Chunks<'a, ToneError> {
        let delay = Duration::from_millis(settings.delay_ms as u64);
        Box::new(text.split_whitespace().enumerate().map(move |(idx, _word)| {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            if settings.fail_at_chunk == Some(idx as u32) {
                return Err(ToneError::ToneError(format!("word {idx} failed")));
            }
            self.produced.fetch_add(1, Ordering::SeqCst);
            Ok(session.tone.clone())
        }))
    }

    fn requires_reload(&self, current: &ToneSettings, next: &ToneSettings) -> bool {
        current.frequency_hz != next.frequency_hz
            || current.chunk_ms != next.chunk_ms
            || current.fail_on_start != next.fail_on_start
    }
}

const FRENCH: &[(&str, &str)] = &[
    ("Tone", "Tonalité"),
    ("Frequency", "Fréquence"),
    ("Pitch of the generated tone in hertz.", "Hauteur de la tonalité générée en hertz."),
];

const GERMAN: &[(&str, &str)] = &[("Tone", "Ton"), ("Frequency", "Frequenz")];

/// Plugin wrapping [`ToneEngine`].
///
/// Every backend created from one plugin value shares counters of produced
/// chunks and live sessions, so tests can observe when production stops and
/// when resources are released.
#[derive(Debug, Clone)]
pub struct MockTonePlugin {
    pub id: &'static str,
    produced: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl MockTonePlugin {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            produced: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(self.clone())
    }

    /// Chunks produced so far by all backends of this plugin
    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }

    /// Sessions loaded and not yet released
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl TTSPlugin for MockTonePlugin {
    type Settings = ToneSettings;

    fn id(&self) -> PluginId {
        PluginId::new(self.id)
    }

    fn display_name(&self) -> &'static str {
        "Tone"
    }

    fn catalogue(&self) -> Catalogue {
        Catalogue::default()
            .with_translations("fr", FRENCH)
            .with_translations("de", GERMAN)
    }

    fn audio_spec(&self) -> AudioSpec {
        AudioSpec::pcm_s16le_mono(TONE_SAMPLE_RATE)
    }

    fn supported_locales(&self) -> &'static [&'static str] {
        &["en_US"]
    }

    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
        let engine = ToneEngine {
            produced: Arc::clone(&self.produced),
            live: Arc::clone(&self.live),
        };
        Ok(Box::new(EngineBackend::new(self.id(), engine, settings)?))
    }
}
