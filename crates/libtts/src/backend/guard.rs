use super::TTSBackend;
use crate::error::TTSResult;
use std::ops::Deref;

/// Started backend that is stopped again when the guard goes away.
///
/// Prefer [`BackendGuard::finish`] to observe stop errors. A guard that is
/// simply dropped releases the backend synchronously through
/// [`TTSBackend::release`], so it is safe to drop from any executor or from
/// plain threads.
pub struct BackendGuard {
    backend: Box<dyn TTSBackend>,
}

impl BackendGuard {
    /// Start `backend` and guard it.
    pub async fn start(backend: Box<dyn TTSBackend>) -> TTSResult<Self> {
        backend.start().await?;
        Ok(Self { backend })
    }

    /// Stop the backend, reporting any error.
    pub async fn finish(self) -> TTSResult<()> {
        self.backend.stop().await
    }
}

impl Deref for BackendGuard {
    type Target = dyn TTSBackend;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}

impl Drop for BackendGuard {
    fn drop(&mut self) {
        if self.backend.is_started() {
            log::debug!("Releasing guarded TTS backend '{}'", self.backend.plugin_id());
            self.backend.release();
        }
    }
}
