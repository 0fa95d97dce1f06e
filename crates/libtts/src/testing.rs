//! Minimal plugin shared by unit tests.

use crate::backend::{Chunks, EngineBackend, SpeechEngine, TTSBackend};
use crate::error::TTSResult;
use crate::i18n::Catalogue;
use crate::plugin::{PluginDescriptor, TTSPlugin};
use crate::settings::{Settings, SettingsModel};
use crate::types::{AudioSpec, PluginId};
use async_trait::async_trait;
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ChimeSettings {
    #[schemars(title = "Pitch", description = "Base pitch of the chime.")]
    #[schemars(range(min = 100, max = 2000))]
    pub pitch: u32,
    pub label: Option<String>,
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            pitch: 440,
            label: None,
        }
    }
}

impl SettingsModel for ChimeSettings {}

pub(crate) struct ChimeEngine;

#[async_trait]
impl SpeechEngine for ChimeEngine {
    type Settings = ChimeSettings;
    type Session = ();
    type Error = Infallible;

    fn audio_spec(&self) -> AudioSpec {
        AudioSpec::pcm_s16le_mono(8_000)
    }

    async fn load(&self, _settings: &ChimeSettings) -> Result<(), Infallible> {
        Ok(())
    }

    fn synthesize<'a>(
        &'a self,
        _session: &'a (),
        _settings: &'a ChimeSettings,
        _text: &'a str,
    ) -> Chunks<'a, Infallible> {
        Box::new(std::iter::once(Ok(Bytes::from_static(&[0, 0]))))
    }
}

pub(crate) struct ChimePlugin {
    id: &'static str,
}

impl ChimePlugin {
    pub(crate) fn new(id: &'static str) -> Self {
        Self { id }
    }

    pub(crate) fn descriptor(id: &'static str) -> PluginDescriptor {
        PluginDescriptor::new(Self::new(id))
    }
}

impl TTSPlugin for ChimePlugin {
    type Settings = ChimeSettings;

    fn id(&self) -> PluginId {
        PluginId::new(self.id)
    }

    fn display_name(&self) -> &'static str {
        "Chime"
    }

    fn catalogue(&self) -> Catalogue {
        Catalogue::default().with_translations(
            "de",
            &[
                ("Chime", "Glocke"),
                ("Pitch", "Tonhöhe"),
                ("Base pitch of the chime.", "Grundton der Glocke."),
            ],
        )
    }

    fn audio_spec(&self) -> AudioSpec {
        ChimeEngine.audio_spec()
    }

    fn supported_locales(&self) -> &'static [&'static str] {
        &["de_DE"]
    }

    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
        Ok(Box::new(EngineBackend::new(self.id(), ChimeEngine, settings)?))
    }
}
