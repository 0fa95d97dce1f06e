use crate::backend::BackendState;
use crate::settings::SettingsErrors;
use crate::types::PluginId;
use thiserror::Error;

/// TTS-related errors
#[derive(Error, Debug)]
pub enum TTSError {
    /// One or more settings failed validation; every offending key is listed.
    #[error(
        "Invalid settings:\n{0}\nSuggestion: Use settings_specification() to see the accepted keys and constraints"
    )]
    InvalidSettings(SettingsErrors),

    /// Plugin id not present in the registry
    #[error("TTS plugin not found: '{0}'\nSuggestion: Use list_ids() to see all discovered plugins")]
    UnknownPlugin(PluginId),

    /// Operation not permitted in the backend's current lifecycle state
    #[error(
        "Operation '{operation}' is not allowed while the backend is {state}\nSuggestion: Transition the backend with start() or stop() first"
    )]
    InvalidState {
        state: BackendState,
        operation: &'static str,
    },

    /// Backend-internal setup failed during start; the instance is now unusable
    #[error(
        "Backend initialization failed: {reason}\nPlugin: {plugin}\nSuggestion: Discard this backend and create a new one with corrected settings"
    )]
    BackendInitialization { plugin: PluginId, reason: String },

    /// A conversion is already in flight on this backend
    #[error(
        "Backend is busy with another conversion\nPlugin: {0}\nSuggestion: Wait for the current audio stream to finish or drop it"
    )]
    BackendBusy(PluginId),

    /// Input rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conversion failed after it started producing audio
    #[error("Conversion failed at chunk {chunk}: {reason}\nPlugin: {plugin}")]
    ConversionFailed {
        plugin: PluginId,
        chunk: usize,
        reason: String,
    },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TTSError {
    pub fn invalid_state(state: BackendState, operation: &'static str) -> Self {
        Self::InvalidState { state, operation }
    }

    pub fn initialization(plugin: impl Into<PluginId>, reason: impl Into<String>) -> Self {
        Self::BackendInitialization {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    pub fn conversion(plugin: impl Into<PluginId>, chunk: usize, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            plugin: plugin.into(),
            chunk,
            reason: reason.into(),
        }
    }
}

/// Result type for TTS operations
pub type TTSResult<T> = Result<T, TTSError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SettingError, SettingErrorKind};

    #[test]
    fn test_invalid_state_names_state_and_operation() {
        let err = TTSError::invalid_state(BackendState::Created, "convert");
        let message = err.to_string();
        assert!(message.contains("'convert'"));
        assert!(message.contains("created"));
    }

    #[test]
    fn test_invalid_settings_lists_every_key() {
        let errors = SettingsErrors::from(vec![
            SettingError::new("speed", SettingErrorKind::Missing),
            SettingError::new("pitch", SettingErrorKind::Unknown),
        ]);
        let message = TTSError::InvalidSettings(errors).to_string();
        assert!(message.contains("speed"));
        assert!(message.contains("pitch"));
    }

    #[test]
    fn test_unknown_plugin_message() {
        let err = TTSError::UnknownPlugin(PluginId::new("nope_v1"));
        assert!(err.to_string().contains("'nope_v1'"));
    }
}
