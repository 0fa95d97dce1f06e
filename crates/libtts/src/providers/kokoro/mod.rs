//! Kokoro text-to-speech plugin
//!
//! Kokoro is an 82M parameter TTS model speaking American English, British
//! English and French at 24 kHz. Weight loading and inference are supplied by
//! the host application through a [`KokoroModelLoader`]; the plugin registers
//! itself with the global registry once a loader is installed.
//!
//! # Examples
//!
//! ```no_run
//! use libtts::providers::kokoro::{
//!     KokoroLoadRequest, KokoroModel, KokoroModelLoader, Result, install_model_loader,
//! };
//! use libtts::{BackendGuard, global_registry};
//!
//! struct MyLoader;
//!
//! impl KokoroModelLoader for MyLoader {
//!     fn load(&self, request: &KokoroLoadRequest) -> Result<Box<dyn KokoroModel>> {
//!         unimplemented!("load weights from {}", request.repo_id)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     install_model_loader(MyLoader);
//!
//!     let registry = global_registry();
//!     registry.enable("kokoro_v1")?;
//!     let descriptor = registry.get_descriptor("kokoro_v1")?;
//!
//!     let backend = descriptor.make_backend(&descriptor.make_default_settings())?;
//!     let backend = BackendGuard::start(backend).await?;
//!     let audio = libtts::collect_audio(backend.convert("Hello, world!").await?).await?;
//!     println!("{} bytes of PCM", audio.len());
//!     Ok(())
//! }
//! ```

pub mod conversion;
pub mod engine;
pub mod error;
pub mod settings;

mod plugin;

/// Identifier of the Kokoro plugin
pub const KOKORO_PLUGIN_ID: &str = "kokoro_v1";

// Re-exports
pub use conversion::samples_to_pcm_s16le;
pub use engine::{
    KOKORO_SAMPLE_RATE, KokoroEngine, KokoroLoadRequest, KokoroModel, KokoroModelLoader,
    SampleChunks, VoiceSource,
};
pub use error::{KokoroError, Result};
pub use plugin::{KokoroPlugin, install_model_loader, model_loader};
pub use settings::{DEFAULT_REPO_ID, KokoroDevice, KokoroLocale, KokoroSettings, KokoroVoice};
