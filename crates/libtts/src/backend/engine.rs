use super::{BackendState, TTSBackend, log_excerpt};
use crate::error::{TTSError, TTSResult};
use crate::settings::{Settings, SettingsModel};
use crate::types::{AudioSpec, AudioStream, PluginId};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::{Context, Poll};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Lazily produced audio chunks of one conversion.
pub type Chunks<'a, E> = Box<dyn Iterator<Item = Result<Bytes, E>> + Send + 'a>;

/// The engine-specific half of a backend.
///
/// An engine knows how to load its resources into a session and how to turn
/// text into audio with them. Everything else (lifecycle enforcement, settings
/// swaps, single-flight conversions, streaming and cancellation) is provided
/// by [`EngineBackend`].
#[async_trait]
pub trait SpeechEngine: Send + Sync + 'static {
    type Settings: SettingsModel;
    /// Loaded resources, shared by every conversion until the backend stops
    type Session: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn audio_spec(&self) -> AudioSpec;

    /// Load resources for `settings`.
    async fn load(&self, settings: &Self::Settings) -> Result<Self::Session, Self::Error>;

    /// Synthesize `text`.
    ///
    /// Runs on a blocking thread. Chunks are forwarded to the caller as soon as
    /// the iterator yields them; iteration stops early when the caller drops
    /// the stream or after the first error.
    fn synthesize<'a>(
        &'a self,
        session: &'a Self::Session,
        settings: &'a Self::Settings,
        text: &'a str,
    ) -> Chunks<'a, Self::Error>;

    /// Whether switching from `current` to `next` needs a fresh session.
    fn requires_reload(&self, current: &Self::Settings, next: &Self::Settings) -> bool {
        let _ = (current, next);
        false
    }
}

/// [`TTSBackend`] implementation driving a [`SpeechEngine`].
pub struct EngineBackend<E: SpeechEngine> {
    plugin: PluginId,
    engine: Arc<E>,
    settings: RwLock<Arc<E::Settings>>,
    state: Mutex<BackendState>,
    session: Mutex<Option<Arc<E::Session>>>,
    busy: Arc<AtomicBool>,
    // Serializes start, stop and settings swaps
    lifecycle: tokio::sync::Mutex<()>,
}

impl<E: SpeechEngine> EngineBackend<E> {
    /// Create a backend in the `Created` state.
    ///
    /// `settings` are re-validated, so values that went through storage or
    /// were built for another plugin are rejected here.
    pub fn new(plugin: impl Into<PluginId>, engine: E, settings: &Settings) -> TTSResult<Self> {
        let plugin = plugin.into();
        let model: E::Settings = settings.to_model(&plugin)?;
        Ok(Self {
            plugin,
            engine: Arc::new(engine),
            settings: RwLock::new(Arc::new(model)),
            state: Mutex::new(BackendState::Created),
            session: Mutex::new(None),
            busy: Arc::new(AtomicBool::new(false)),
            lifecycle: tokio::sync::Mutex::new(()),
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Typed view of the settings currently in use.
    pub fn settings(&self) -> Arc<E::Settings> {
        Arc::clone(&self.settings.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn set_state(&self, state: BackendState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != state {
            log::debug!("TTS backend '{}': {} -> {}", self.plugin, *current, state);
            *current = state;
        }
    }

    fn set_session(&self, session: Option<E::Session>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session.map(Arc::new);
    }

    fn session(&self) -> Option<Arc<E::Session>> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fail(&self, reason: impl std::fmt::Display) -> TTSError {
        log::error!("TTS backend '{}' failed: {}", self.plugin, reason);
        self.set_session(None);
        self.set_state(BackendState::Failed);
        TTSError::initialization(self.plugin.clone(), reason.to_string())
    }
}

#[async_trait]
impl<E: SpeechEngine> TTSBackend for EngineBackend<E> {
    fn plugin_id(&self) -> &PluginId {
        &self.plugin
    }

    fn audio_spec(&self) -> AudioSpec {
        self.engine.audio_spec()
    }

    fn state(&self) -> BackendState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_settings(&self) -> Settings {
        Settings::from_model(self.plugin.clone(), &*self.settings())
    }

    async fn start(&self) -> TTSResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        match self.state() {
            BackendState::Ready | BackendState::Running => return Ok(()),
            BackendState::Failed => {
                return Err(TTSError::invalid_state(BackendState::Failed, "start"));
            }
            BackendState::Created | BackendState::Stopped => {}
        }

        log::info!("Starting TTS backend '{}'", self.plugin);
        let settings = self.settings();
        match self.engine.load(&settings).await {
            Ok(session) => {
                self.set_session(Some(session));
                self.set_state(BackendState::Ready);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn stop(&self) -> TTSResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        self.release();
        Ok(())
    }

    fn release(&self) {
        if !self.state().is_started() {
            return;
        }
        log::info!("Stopping TTS backend '{}'", self.plugin);
        self.set_session(None);
        self.set_state(BackendState::Stopped);
    }

    async fn update_settings(&self, settings: Settings) -> TTSResult<()> {
        let next: E::Settings = settings.to_model(&self.plugin)?;
        let _lifecycle = self.lifecycle.lock().await;
        let current = self.settings();
        if *current == next {
            return Ok(());
        }

        if self.state().is_started() && self.engine.requires_reload(&current, &next) {
            log::info!("Reloading TTS backend '{}' for new settings", self.plugin);
            let session = self.engine.load(&next).await.map_err(|e| self.fail(e))?;
            self.set_session(Some(session));
        }

        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }

    async fn convert(&self, text: &str) -> TTSResult<AudioStream> {
        let _lifecycle = self.lifecycle.lock().await;
        let state = self.state();
        if !state.can_convert() {
            return Err(TTSError::invalid_state(state, "convert"));
        }
        if text.trim().is_empty() {
            return Err(TTSError::InvalidInput(
                "text must contain at least one non-whitespace character".to_string(),
            ));
        }
        let busy = BusyGuard::acquire(&self.busy)
            .ok_or_else(|| TTSError::BackendBusy(self.plugin.clone()))?;
        let session = self
            .session()
            .ok_or_else(|| TTSError::invalid_state(state, "convert"))?;
        self.set_state(BackendState::Running);

        let settings = self.settings();
        let engine = Arc::clone(&self.engine);
        let plugin = self.plugin.clone();
        let text = text.to_string();
        log::debug!("Converting with '{}': {}", plugin, log_excerpt(&text));

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let job = move || {
            for (idx, chunk) in engine.synthesize(&session, &settings, &text).enumerate() {
                let item = match chunk {
                    Ok(bytes) if bytes.is_empty() => continue,
                    Ok(bytes) => Ok(bytes),
                    Err(e) => Err(TTSError::conversion(plugin.clone(), idx, e.to_string())),
                };
                let failed = item.is_err();
                if tx.send(item).is_err() {
                    log::debug!("Audio stream for '{plugin}' dropped, cancelling conversion");
                    break;
                }
                if failed {
                    break;
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                std::thread::spawn(job);
            }
        }

        Ok(Box::pin(BusyStream {
            inner: UnboundedReceiverStream::new(rx),
            guard: Some(busy),
        }))
    }
}

/// Marks a backend busy until dropped.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Audio stream that releases the busy flag when exhausted or dropped.
struct BusyStream {
    inner: UnboundedReceiverStream<TTSResult<Bytes>>,
    guard: Option<BusyGuard>,
}

impl Stream for BusyStream {
    type Item = TTSResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = poll {
            self.guard.take();
        }
        poll
    }
}
