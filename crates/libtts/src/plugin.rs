//! Plugin authoring trait and the type-erased descriptor the registry hands out.

use crate::backend::TTSBackend;
use crate::error::TTSResult;
use crate::i18n::{Catalogue, LocaleResolver};
use crate::settings::{Settings, SettingsDict, SettingsModel, SettingsSpecification, dict_from_json};
use crate::types::{AudioSpec, PluginId};
use std::fmt;
use std::sync::Arc;

/// A TTS plugin: one backend type plus everything needed to configure it.
///
/// ```ignore
/// struct MyPlugin;
///
/// impl TTSPlugin for MyPlugin {
///     type Settings = MySettings;
///
///     fn id(&self) -> PluginId {
///         PluginId::new("my_engine_v1")
///     }
///
///     fn display_name(&self) -> &'static str {
///         "My Engine"
///     }
///
///     fn audio_spec(&self) -> AudioSpec {
///         AudioSpec::pcm_s16le_mono(22_050)
///     }
///
///     fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
///         Ok(Box::new(EngineBackend::new(self.id(), MyEngine::default(), settings)?))
///     }
/// }
/// ```
pub trait TTSPlugin: Send + Sync + 'static {
    type Settings: SettingsModel;

    /// Stable id, conventionally suffixed with the plugin's major version
    fn id(&self) -> PluginId;

    /// English display name; doubles as its message id in [`TTSPlugin::catalogue`]
    fn display_name(&self) -> &'static str;

    /// Translations of the display name and of setting titles and descriptions
    fn catalogue(&self) -> Catalogue {
        Catalogue::default()
    }

    /// Audio format every backend of this plugin produces
    fn audio_spec(&self) -> AudioSpec;

    /// Locales the engine can speak, as locale identifiers
    fn supported_locales(&self) -> &'static [&'static str] {
        &[]
    }

    /// Build a backend in the `Created` state.
    ///
    /// Must re-validate `settings` and fail with
    /// [`TTSError::InvalidSettings`](crate::TTSError::InvalidSettings) when they
    /// do not match [`TTSPlugin::Settings`].
    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>>;
}

/// Object-safe view of a [`TTSPlugin`].
trait ErasedPlugin: Send + Sync {
    fn default_settings(&self, id: &PluginId) -> Settings;
    fn settings_from_dict(&self, id: &PluginId, dict: &SettingsDict) -> TTSResult<Settings>;
    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>>;
    fn audio_spec(&self) -> AudioSpec;
    fn supported_locales(&self) -> &'static [&'static str];
}

impl<P: TTSPlugin> ErasedPlugin for P {
    fn default_settings(&self, id: &PluginId) -> Settings {
        Settings::from_model(id.clone(), &P::Settings::default())
    }

    fn settings_from_dict(&self, id: &PluginId, dict: &SettingsDict) -> TTSResult<Settings> {
        Settings::from_dict::<P::Settings>(id.clone(), dict)
    }

    fn create_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
        TTSPlugin::create_backend(self, settings)
    }

    fn audio_spec(&self) -> AudioSpec {
        TTSPlugin::audio_spec(self)
    }

    fn supported_locales(&self) -> &'static [&'static str] {
        TTSPlugin::supported_locales(self)
    }
}

/// Metadata and factories of one plugin.
///
/// Building a descriptor has no side effects; nothing is loaded until
/// [`make_backend`](PluginDescriptor::make_backend) and the backend's `start`
/// are called. Cheap to clone.
#[derive(Clone)]
pub struct PluginDescriptor {
    id: PluginId,
    display_name: &'static str,
    catalogue: Arc<Catalogue>,
    specification: Arc<SettingsSpecification>,
    plugin: Arc<dyn ErasedPlugin>,
}

impl PluginDescriptor {
    pub fn new<P: TTSPlugin>(plugin: P) -> Self {
        Self {
            id: plugin.id(),
            display_name: plugin.display_name(),
            catalogue: Arc::new(plugin.catalogue()),
            specification: Arc::new(P::Settings::specification()),
            plugin: Arc::new(plugin),
        }
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Display name for `locale`, resolved with the default fallback chain.
    pub fn display_name(&self, locale: &str) -> String {
        self.display_name_with(&LocaleResolver::default(), locale)
    }

    /// Display name for `locale`; the plugin id when no tier matches.
    pub fn display_name_with(&self, resolver: &LocaleResolver, locale: &str) -> String {
        resolver
            .resolve(&self.catalogue, locale, self.display_name)
            .unwrap_or(self.id.as_str())
            .to_string()
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn make_default_settings(&self) -> Settings {
        log::debug!("Creating default settings for '{}'", self.id);
        self.plugin.default_settings(&self.id)
    }

    /// Validate `dict` and wrap it; every offending key is reported at once.
    pub fn make_settings_from_dict(&self, dict: &SettingsDict) -> TTSResult<Settings> {
        log::debug!("Creating settings for '{}' from {} keys", self.id, dict.len());
        self.plugin.settings_from_dict(&self.id, dict)
    }

    /// Same as [`make_settings_from_dict`](Self::make_settings_from_dict) for a JSON object.
    pub fn make_settings_from_json(&self, json: &str) -> TTSResult<Settings> {
        self.make_settings_from_dict(&dict_from_json(json)?)
    }

    pub fn settings_specification(&self) -> &SettingsSpecification {
        &self.specification
    }

    /// Build a backend; fails with `InvalidSettings` on invalid or foreign settings.
    pub fn make_backend(&self, settings: &Settings) -> TTSResult<Box<dyn TTSBackend>> {
        log::debug!("Creating backend for '{}'", self.id);
        self.plugin.create_backend(settings)
    }

    pub fn default_audio_spec(&self) -> AudioSpec {
        self.plugin.audio_spec()
    }

    /// Localized title of setting `key`, or `None` for an unknown key.
    pub fn setting_display_name(&self, key: &str, locale: &str) -> Option<String> {
        self.setting_display_name_with(&LocaleResolver::default(), key, locale)
    }

    pub fn setting_display_name_with(
        &self,
        resolver: &LocaleResolver,
        key: &str,
        locale: &str,
    ) -> Option<String> {
        let field = self.specification.get(key)?;
        Some(self.translate(resolver, locale, field.label()))
    }

    /// Localized description of setting `key`, if it has one.
    pub fn setting_description(&self, key: &str, locale: &str) -> Option<String> {
        self.setting_description_with(&LocaleResolver::default(), key, locale)
    }

    pub fn setting_description_with(
        &self,
        resolver: &LocaleResolver,
        key: &str,
        locale: &str,
    ) -> Option<String> {
        let description = self.specification.get(key)?.description.as_deref()?;
        Some(self.translate(resolver, locale, description))
    }

    pub fn supported_locales(&self) -> &'static [&'static str] {
        self.plugin.supported_locales()
    }

    fn translate(&self, resolver: &LocaleResolver, locale: &str, msgid: &str) -> String {
        resolver
            .resolve(&self.catalogue, locale, msgid)
            .unwrap_or(msgid)
            .to_string()
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}
