//! Kokoro plugin and its link-time registration

use super::KOKORO_PLUGIN_ID;
use super::engine::{KOKORO_SAMPLE_RATE, KokoroEngine, KokoroModelLoader};
use super::error::KokoroError;
use super::settings::KokoroSettings;
use crate::backend::{EngineBackend, TTSBackend};
use crate::error::TTSResult;
use crate::i18n::Catalogue;
use crate::plugin::{PluginDescriptor, TTSPlugin};
use crate::registry::PluginRegistration;
use crate::settings::Settings;
use crate::types::{AudioSpec, PluginId};
use std::sync::{Arc, PoisonError, RwLock};

static MODEL_LOADER: RwLock<Option<Arc<dyn KokoroModelLoader>>> = RwLock::new(None);

/// Install the loader used by the link-time registered Kokoro plugin.
///
/// Must happen before the registry discovers plugins; until then the plugin
/// declines registration. Installing again replaces the previous loader for
/// registries discovered afterwards.
pub fn install_model_loader(loader: impl KokoroModelLoader + 'static) {
    *MODEL_LOADER.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(loader));
    log::debug!("Kokoro model loader installed");
}

/// The installed loader, if any.
pub fn model_loader() -> Option<Arc<dyn KokoroModelLoader>> {
    MODEL_LOADER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Kokoro TTS plugin
pub struct KokoroPlugin {
    loader: Arc<dyn KokoroModelLoader>,
}

impl KokoroPlugin {
    pub fn new(loader: Arc<dyn KokoroModelLoader>) -> Self {
        Self { loader }
    }

    /// Plugin backed by the installed loader.
    pub fn from_installed_loader() -> Result<Self, KokoroError> {
        model_loader()
            .map(Self::new)
            .ok_or(KokoroError::NoModelLoader)
    }
}

const FRENCH: &[(&str, &str)] = &[
    ("Kokoro", "Kokoro"),
    ("Locale", "Paramètres régionaux"),
    (
        "The regional or international locale setting.",
        "Le paramètre régional ou international.",
    ),
    ("Voice", "Voix"),
    (
        "The voice used by the text-to-speech system.",
        "La voix utilisée par le système de synthèse vocale.",
    ),
    ("Speed", "Vitesse"),
    (
        "The speaking speed of the text-to-speech system.",
        "La vitesse d'élocution du système de synthèse vocale.",
    ),
    ("Compute Device", "Appareil de calcul"),
    (
        "The device used for running the TTS system (e.g., cpu or cuda).",
        "L'appareil utilisé pour exécuter le système de synthèse vocale (par ex. cpu ou cuda).",
    ),
    ("Repository ID", "Identifiant du dépôt"),
    (
        "The identifier or path of the Kokoro TTS HuggingFace repository.",
        "L'identifiant ou le chemin du dépôt HuggingFace de Kokoro TTS.",
    ),
    ("Model File Path", "Chemin du fichier de modèle"),
    (
        "The file path to the Kokoro TTS model file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically.",
        "Le chemin du fichier de modèle Kokoro TTS. Requis uniquement hors ligne ou en environnement isolé ; sinon, les fichiers sont téléchargés et mis en cache automatiquement.",
    ),
    ("Configuration File Path", "Chemin du fichier de configuration"),
    (
        "The file path to the Kokoro TTS configuration file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically.",
        "Le chemin du fichier de configuration Kokoro TTS. Requis uniquement hors ligne ou en environnement isolé ; sinon, les fichiers sont téléchargés et mis en cache automatiquement.",
    ),
    ("Voice File Path", "Chemin du fichier de voix"),
    (
        "The file path to the Kokoro TTS voice file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically.",
        "Le chemin du fichier de voix Kokoro TTS. Requis uniquement hors ligne ou en environnement isolé ; sinon, les fichiers sont téléchargés et mis en cache automatiquement.",
    ),
];

impl TTSPlugin for KokoroPlugin {
    type Settings = KokoroSettings;

    fn id(&self) -> PluginId {
        PluginId::new(KOKORO_PLUGIN_ID)
    }

    fn display_name(&self) -> &'static str {
        "Kokoro"
    }

    fn catalogue(&self) -> Catalogue {
        Catalogue::default().with_translations("fr", FRENCH)
    }

    fn audio_spec(&self) -> AudioSpec {
        AudioSpec::pcm_s16le_mono(KOKORO_SAMPLE_RATE)
    }

    fn supported_locales(&self) -> &'static [&'static str] {
        &["en_US", "en_GB", "fr_FR"]
    }

    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
        let engine = KokoroEngine::new(Arc::clone(&self.loader));
        Ok(Box::new(EngineBackend::new(self.id(), engine, settings)?))
    }
}

fn register() -> Option<PluginDescriptor> {
    match KokoroPlugin::from_installed_loader() {
        Ok(plugin) => Some(PluginDescriptor::new(plugin)),
        Err(e) => {
            log::debug!("Kokoro plugin unavailable: {e}");
            None
        }
    }
}

inventory::submit! {
    PluginRegistration::new(KOKORO_PLUGIN_ID, register)
}
