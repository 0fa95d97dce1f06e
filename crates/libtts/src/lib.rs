//! # libtts
//!
//! Pluggable text-to-speech for applications that should not care which
//! engine is speaking.
//!
//! ## Features
//!
//! - **Plugin Discovery**: Engines register at link time and are collected by a
//!   [`PluginRegistry`]; each can be enabled or disabled at runtime
//! - **Typed Settings**: Every plugin declares its settings as a serde struct;
//!   the crate derives validation, defaults, a flat dictionary form and a
//!   UI-ready [`SettingsSpecification`] from it
//! - **Backend Lifecycle**: [`TTSBackend`] instances move through an explicit
//!   start/convert/stop state machine and stream PCM audio chunk by chunk
//! - **Localized Metadata**: Display names resolve through a chain of locale
//!   strategies, so `en_CA` finds the `en` translation
//!
//! ## Architecture
//!
//! - [`TTSPlugin`]: implemented once per engine; describes it and builds backends
//! - [`PluginDescriptor`]: type-erased handle the registry hands out
//! - [`SpeechEngine`] / [`EngineBackend`]: the usual way to implement a backend
//! - [`BackendGuard`]: stops a started backend when it goes out of scope
//!
//! ## Providers
//!
//! Enable providers using feature flags:
//! - `kokoro`: Kokoro 82M (American English, British English, French)
//!
//! ## Example
//!
//! ```rust,no_run
//! use libtts::{BackendGuard, ListFilter, collect_audio, global_registry};
//!
//! async fn speak(text: &str) -> libtts::TTSResult<Vec<u8>> {
//!     let registry = global_registry();
//!     for (id, name) in registry.display_names("en_CA", ListFilter::All) {
//!         println!("{id}: {name}");
//!     }
//!
//!     registry.enable("kokoro_v1")?;
//!     let descriptor = registry.get_descriptor("kokoro_v1")?;
//!     let settings = descriptor.make_default_settings();
//!
//!     let backend = BackendGuard::start(descriptor.make_backend(&settings)?).await?;
//!     let audio = collect_audio(backend.convert(text).await?).await?;
//!     backend.finish().await?;
//!     Ok(audio)
//! }
//! ```

pub mod backend;
pub mod error;
pub mod i18n;
pub mod plugin;
pub mod registry;
pub mod settings;
pub mod types;

// Provider implementations
pub mod providers;

#[cfg(test)]
mod testing;

// Re-export main types
pub use backend::{BackendGuard, BackendState, Chunks, EngineBackend, SpeechEngine, TTSBackend};
pub use error::{TTSError, TTSResult};
pub use i18n::{Catalogue, Locale, LocaleResolver};
pub use plugin::{PluginDescriptor, TTSPlugin};
pub use registry::{
    InventorySource, ListFilter, PluginRegistration, PluginRegistry, PluginSource, RegistryConfig,
    StaticSource, global_registry,
};
pub use settings::{
    SettingError, SettingErrorKind, SettingKind, SettingSpec, Settings, SettingsDict,
    SettingsErrors, SettingsModel, SettingsSpecification,
};
pub use types::{AudioFormat, AudioSpec, AudioStream, ByteOrder, PluginId, SampleType, collect_audio};

// Plugins outside this crate register through `libtts::inventory::submit!`.
pub use inventory;
