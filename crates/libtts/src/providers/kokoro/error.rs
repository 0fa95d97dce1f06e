//! Error types for the Kokoro plugin

use super::KOKORO_PLUGIN_ID;
use crate::TTSError;
use std::path::PathBuf;
use thiserror::Error;

/// Kokoro specific errors
#[derive(Error, Debug)]
pub enum KokoroError {
    /// A configured local file does not exist
    #[error(
        "Configured file does not exist: {path}\nSetting: {setting}\nSuggestion: Fix the path or clear the setting to download files automatically"
    )]
    MissingFile { setting: &'static str, path: PathBuf },

    /// No model loader was installed by the host application
    #[error(
        "No Kokoro model loader installed\nSuggestion: Call install_model_loader() before discovering plugins"
    )]
    NoModelLoader,

    /// Model or voice loading failed
    #[error("Kokoro model loading failed: {0}\nRepository: {1}")]
    ModelLoad(String, String),

    /// Inference failed
    #[error("Kokoro generation failed: {0}\nStage: {1}")]
    Generation(String, String),

    /// The blocking worker died
    #[error("Kokoro worker failed: {0}")]
    Worker(String),
}

impl KokoroError {
    pub fn model_load(msg: impl Into<String>, repo_id: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into(), repo_id.into())
    }

    pub fn generation(msg: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::Generation(msg.into(), stage.into())
    }
}

/// Result type for Kokoro operations
pub type Result<T> = std::result::Result<T, KokoroError>;

impl From<KokoroError> for TTSError {
    fn from(err: KokoroError) -> Self {
        match err {
            KokoroError::Generation(msg, stage) => {
                TTSError::conversion(KOKORO_PLUGIN_ID, 0, format!("{msg} (stage: {stage})"))
            }
            other => TTSError::initialization(KOKORO_PLUGIN_ID, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_message() {
        let err = KokoroError::MissingFile {
            setting: "model_path",
            path: PathBuf::from("/models/kokoro.pth"),
        };
        let message = err.to_string();
        assert!(message.contains("/models/kokoro.pth"));
        assert!(message.contains("model_path"));
    }

    #[test]
    fn test_conversion_into_tts_error() {
        let err: TTSError = KokoroError::NoModelLoader.into();
        assert!(matches!(
            err,
            TTSError::BackendInitialization { ref plugin, .. } if plugin == "kokoro_v1"
        ));

        let err: TTSError = KokoroError::generation("nan in output", "decoder").into();
        assert!(matches!(err, TTSError::ConversionFailed { chunk: 0, .. }));
    }
}
