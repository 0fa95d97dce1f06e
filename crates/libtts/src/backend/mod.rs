//! Backend contract and lifecycle.
//!
//! Every TTS engine is driven through [`TTSBackend`]. Its lifecycle is an
//! explicit state machine:
//!
//! ```text
//!            start              convert
//! Created ──────────▶ Ready ──────────▶ Running
//!                     ▲  │                 │
//!               start │  │ stop       stop │
//!                     │  ▼                 ▼
//!                    Stopped ◀─────────────┘
//!
//! any state ── unrecoverable error ──▶ Failed
//! ```
//!
//! Engines rarely implement [`TTSBackend`] by hand. They implement
//! [`SpeechEngine`] and let [`EngineBackend`] enforce the contract.

mod engine;
mod guard;

pub use engine::{Chunks, EngineBackend, SpeechEngine};
pub use guard::BackendGuard;

use crate::error::TTSResult;
use crate::settings::Settings;
use crate::types::{AudioSpec, AudioStream, PluginId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a backend instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendState {
    /// Constructed with valid settings, no resources loaded
    Created,
    /// Resources loaded, ready to convert
    Ready,
    /// At least one conversion has been issued since the last start
    Running,
    /// Resources released; may be started again
    Stopped,
    /// Unrecoverable error; the instance must be discarded
    Failed,
}

impl BackendState {
    /// Whether `convert` is permitted.
    pub fn can_convert(self) -> bool {
        matches!(self, BackendState::Ready | BackendState::Running)
    }

    /// Whether engine resources are held.
    pub fn is_started(self) -> bool {
        self.can_convert()
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendState::Created => "created",
            BackendState::Ready => "ready",
            BackendState::Running => "running",
            BackendState::Stopped => "stopped",
            BackendState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Common interface of every TTS backend instance.
///
/// A backend is owned by exactly one caller, which is responsible for calling
/// [`stop`](TTSBackend::stop) when done (see [`BackendGuard`]). Methods take
/// `&self`; implementations use interior mutability so that a second
/// concurrent [`convert`](TTSBackend::convert) can be detected and rejected.
#[async_trait]
pub trait TTSBackend: Send + Sync {
    /// Id of the plugin that manufactured this backend
    fn plugin_id(&self) -> &PluginId;

    /// Format of every chunk produced by [`convert`](TTSBackend::convert)
    fn audio_spec(&self) -> AudioSpec;

    fn state(&self) -> BackendState;

    /// Settings currently in use
    fn current_settings(&self) -> Settings;

    /// Load backend resources. No-op when already started.
    async fn start(&self) -> TTSResult<()>;

    /// Release backend resources. No-op when not started.
    async fn stop(&self) -> TTSResult<()>;

    /// Release backend resources without waiting.
    ///
    /// Same outcome as [`stop`](TTSBackend::stop), for teardown paths that
    /// cannot await such as [`BackendGuard`]'s drop.
    fn release(&self);

    /// Replace the settings wholesale.
    ///
    /// Invalid settings are rejected and the previous settings stay in effect.
    /// In-flight conversions keep the settings they started with.
    async fn update_settings(&self, settings: Settings) -> TTSResult<()>;

    /// Convert non-empty `text` to a stream of audio chunks.
    async fn convert(&self, text: &str) -> TTSResult<AudioStream>;

    fn is_started(&self) -> bool {
        self.state().is_started()
    }
}

/// Shorten `text` for log output.
pub(crate) fn log_excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 100;
    match text.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
