//! Bundled TTS plugins
//!
//! Each plugin is feature-gated and registers itself with the global registry
//! when its feature is enabled.

#[cfg(feature = "kokoro")]
pub mod kokoro;
