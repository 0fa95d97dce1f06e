//! Kokoro speech engine
//!
//! Inference itself lives behind [`KokoroModel`], produced by a
//! [`KokoroModelLoader`] the host application supplies. This engine owns the
//! parts around it: file checks, blocking-pool loading and sample conversion.

use super::conversion::samples_to_pcm_s16le;
use super::error::{KokoroError, Result};
use super::settings::{KokoroDevice, KokoroSettings, KokoroVoice};
use crate::backend::{Chunks, SpeechEngine};
use crate::types::AudioSpec;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sample rate of every Kokoro voice
pub const KOKORO_SAMPLE_RATE: u32 = 24_000;

/// Lazily produced float sample chunks in `[-1.0, 1.0]`.
pub type SampleChunks<'a> = Box<dyn Iterator<Item = Result<Vec<f32>>> + Send + 'a>;

/// A loaded Kokoro pipeline with its voice.
pub trait KokoroModel: Send + Sync {
    /// Synthesize `text` at `speed`, one chunk per generated segment.
    fn generate<'a>(&'a self, text: &'a str, speed: f64) -> SampleChunks<'a>;
}

/// Voice to load into the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceSource {
    Named(KokoroVoice),
    File(PathBuf),
}

/// Everything a loader needs to build a [`KokoroModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct KokoroLoadRequest {
    pub repo_id: String,
    pub lang_code: char,
    pub device: Option<KokoroDevice>,
    pub model_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub voice: VoiceSource,
}

impl From<&KokoroSettings> for KokoroLoadRequest {
    fn from(settings: &KokoroSettings) -> Self {
        Self {
            repo_id: settings.repo_id.clone(),
            lang_code: settings.lang_code(),
            device: settings.device,
            model_path: settings.model_path.clone(),
            config_path: settings.config_path.clone(),
            voice: match &settings.voice_path {
                Some(path) => VoiceSource::File(path.clone()),
                None => VoiceSource::Named(settings.voice),
            },
        }
    }
}

/// Builds [`KokoroModel`]s; may block on downloads and weight loading.
pub trait KokoroModelLoader: Send + Sync {
    fn load(&self, request: &KokoroLoadRequest) -> Result<Box<dyn KokoroModel>>;
}

/// [`SpeechEngine`] for Kokoro.
pub struct KokoroEngine {
    loader: Arc<dyn KokoroModelLoader>,
}

impl KokoroEngine {
    pub fn new(loader: Arc<dyn KokoroModelLoader>) -> Self {
        Self { loader }
    }

    fn check_files(settings: &KokoroSettings) -> Result<()> {
        let configured = [
            ("model_path", settings.model_path.as_deref()),
            ("config_path", settings.config_path.as_deref()),
            ("voice_path", settings.voice_path.as_deref()),
        ];
        for (setting, path) in configured {
            if let Some(path) = path.filter(|path| !Path::exists(path)) {
                return Err(KokoroError::MissingFile {
                    setting,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechEngine for KokoroEngine {
    type Settings = KokoroSettings;
    type Session = Box<dyn KokoroModel>;
    type Error = KokoroError;

    fn audio_spec(&self) -> AudioSpec {
        AudioSpec::pcm_s16le_mono(KOKORO_SAMPLE_RATE)
    }

    async fn load(&self, settings: &KokoroSettings) -> Result<Box<dyn KokoroModel>> {
        Self::check_files(settings)?;

        let request = KokoroLoadRequest::from(settings);
        log::debug!(
            "Loading Kokoro model from '{}' (lang code '{}', voice {:?})",
            request.repo_id,
            request.lang_code,
            request.voice
        );

        let loader = Arc::clone(&self.loader);
        let model = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle
                .spawn_blocking(move || loader.load(&request))
                .await
                .map_err(|e| KokoroError::Worker(e.to_string()))??,
            Err(_) => loader.load(&request)?,
        };
        log::debug!("Kokoro model loaded");
        Ok(model)
    }

    fn synthesize<'a>(
        &'a self,
        session: &'a Box<dyn KokoroModel>,
        settings: &'a KokoroSettings,
        text: &'a str,
    ) -> Chunks<'a, KokoroError> {
        Box::new(
            session
                .generate(text, settings.speed)
                .map(|samples| samples.map(|samples| samples_to_pcm_s16le(&samples))),
        )
    }

    /// Only speed is applied per conversion; everything else is baked into the
    /// loaded pipeline.
    fn requires_reload(&self, current: &KokoroSettings, next: &KokoroSettings) -> bool {
        KokoroSettings {
            speed: next.speed,
            ..current.clone()
        } != *next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::kokoro::KokoroLocale;
    use std::sync::Mutex;

    struct Silence;

    impl KokoroModel for Silence {
        fn generate<'a>(&'a self, text: &'a str, _speed: f64) -> SampleChunks<'a> {
            Box::new(text.split_whitespace().map(|_| Ok(vec![0.0; 4])))
        }
    }

    #[derive(Default)]
    struct RecordingLoader {
        requests: Mutex<Vec<KokoroLoadRequest>>,
    }

    impl KokoroModelLoader for RecordingLoader {
        fn load(&self, request: &KokoroLoadRequest) -> Result<Box<dyn KokoroModel>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(Box::new(Silence))
        }
    }

    #[test]
    fn test_load_request_prefers_voice_file() {
        let settings = KokoroSettings {
            voice_path: Some(PathBuf::from("/voices/custom.pt")),
            ..Default::default()
        };
        let request = KokoroLoadRequest::from(&settings);
        assert_eq!(request.voice, VoiceSource::File(PathBuf::from("/voices/custom.pt")));
        assert_eq!(request.lang_code, 'a');

        let request = KokoroLoadRequest::from(&KokoroSettings::default());
        assert_eq!(request.voice, VoiceSource::Named(KokoroVoice::AfHeart));
    }

    #[tokio::test]
    async fn test_load_checks_configured_files() {
        let loader = Arc::new(RecordingLoader::default());
        let engine = KokoroEngine::new(loader.clone());
        let settings = KokoroSettings {
            config_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..Default::default()
        };
        let err = engine.load(&settings).await.err().unwrap();
        assert!(matches!(
            err,
            KokoroError::MissingFile {
                setting: "config_path",
                ..
            }
        ));
        assert!(loader.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_with_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("kokoro-v1_0.pth");
        std::fs::write(&model_path, b"weights").unwrap();

        let loader = Arc::new(RecordingLoader::default());
        let engine = KokoroEngine::new(loader.clone());
        let settings = KokoroSettings {
            model_path: Some(model_path.clone()),
            ..Default::default()
        };
        assert!(engine.load(&settings).await.is_ok());
        assert_eq!(
            loader.requests.lock().unwrap()[0].model_path,
            Some(model_path)
        );
    }

    #[test]
    fn test_synthesize_emits_pcm() {
        let engine = KokoroEngine::new(Arc::new(RecordingLoader::default()));
        let session: Box<dyn KokoroModel> = Box::new(Silence);
        let settings = KokoroSettings::default();
        let chunks: Vec<_> = engine
            .synthesize(&session, &settings, "two words")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|chunk| chunk.len() == 8));
    }

    #[test]
    fn test_only_speed_changes_skip_reload() {
        let engine = KokoroEngine::new(Arc::new(RecordingLoader::default()));
        let current = KokoroSettings::default();
        let faster = KokoroSettings {
            speed: 1.5,
            ..Default::default()
        };
        assert!(!engine.requires_reload(&current, &faster));

        let british = KokoroSettings {
            locale: KokoroLocale::EnGb,
            voice: KokoroVoice::BfEmma,
            ..Default::default()
        };
        assert!(engine.requires_reload(&current, &british));
    }
}
