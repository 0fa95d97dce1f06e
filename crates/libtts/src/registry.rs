//! Plugin discovery and the enabled/disabled bookkeeping around it.
//!
//! Plugins register themselves at link time through [`inventory`]:
//!
//! ```ignore
//! fn register() -> Option<PluginDescriptor> {
//!     Some(PluginDescriptor::new(MyPlugin))
//! }
//!
//! inventory::submit! {
//!     PluginRegistration::new("my_engine_v1", register)
//! }
//! ```
//!
//! A hook returns `None` to decline registration, e.g. when a runtime
//! dependency of the plugin is unavailable. Every discovered plugin starts out
//! disabled.

use crate::error::{TTSError, TTSResult};
use crate::i18n::{Locale, LocaleResolver};
use crate::plugin::PluginDescriptor;
use crate::types::PluginId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Link-time registration of one plugin.
pub struct PluginRegistration {
    /// Name used in logs when the hook declines
    pub name: &'static str,
    pub hook: fn() -> Option<PluginDescriptor>,
}

impl PluginRegistration {
    pub const fn new(name: &'static str, hook: fn() -> Option<PluginDescriptor>) -> Self {
        Self { name, hook }
    }
}

inventory::collect!(PluginRegistration);

/// Where a registry finds its plugins.
pub trait PluginSource: Send + Sync {
    /// Produce descriptors in discovery order. Called once per registry.
    ///
    /// Runs without the registry's state lock, so it may read the registry
    /// being discovered. It must not call `discover` on that registry again,
    /// nor touch [`global_registry`] while the global registry initializes.
    fn load(&self) -> Vec<PluginDescriptor>;
}

/// Plugins submitted with `inventory::submit!` anywhere in the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventorySource;

impl PluginSource for InventorySource {
    fn load(&self) -> Vec<PluginDescriptor> {
        let mut registrations: Vec<&PluginRegistration> =
            inventory::iter::<PluginRegistration>.into_iter().collect();
        // Link order is unspecified; keep discovery order stable across builds
        registrations.sort_by_key(|registration| registration.name);

        registrations
            .into_iter()
            .filter_map(|registration| {
                let descriptor = (registration.hook)();
                if descriptor.is_none() {
                    log::debug!("Plugin '{}' declined registration", registration.name);
                }
                descriptor
            })
            .collect()
    }
}

/// A fixed list of descriptors.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    descriptors: Vec<PluginDescriptor>,
}

impl StaticSource {
    pub fn new(descriptors: Vec<PluginDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn with(mut self, descriptor: PluginDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}

impl PluginSource for StaticSource {
    fn load(&self) -> Vec<PluginDescriptor> {
        self.descriptors.clone()
    }
}

/// Which plugins [`PluginRegistry::list_ids`] returns
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    Enabled,
    Disabled,
}

impl ListFilter {
    fn accepts(self, enabled: bool) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Enabled => enabled,
            ListFilter::Disabled => !enabled,
        }
    }
}

/// Registry configuration, typically loaded from the host's config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Last tier of the display-name fallback chain
    pub fallback_locale: Locale,
    /// Plugins enabled right after discovery
    pub enabled: Vec<PluginId>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fallback_locale: Locale::default(),
            enabled: Vec::new(),
        }
    }
}

struct RegistryEntry {
    descriptor: PluginDescriptor,
    enabled: bool,
}

#[derive(Default)]
struct RegistryState {
    discovered: bool,
    entries: Vec<RegistryEntry>,
}

impl RegistryState {
    fn entry_mut(&mut self, id: &str) -> TTSResult<&mut RegistryEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.descriptor.id() == id)
            .ok_or_else(|| TTSError::UnknownPlugin(PluginId::new(id)))
    }

    fn entry(&self, id: &str) -> TTSResult<&RegistryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor.id() == id)
            .ok_or_else(|| TTSError::UnknownPlugin(PluginId::new(id)))
    }
}

/// Discovered plugins and their enabled status.
///
/// Mutations take an exclusive lock; reads share it and always observe a
/// complete state.
pub struct PluginRegistry {
    source: Box<dyn PluginSource>,
    config: RegistryConfig,
    resolver: LocaleResolver,
    state: RwLock<RegistryState>,
    // Serializes discovery so the source loads once
    discovery: Mutex<()>,
}

impl PluginRegistry {
    pub fn new(source: impl PluginSource + 'static) -> Self {
        Self::with_config(source, RegistryConfig::default())
    }

    pub fn with_config(source: impl PluginSource + 'static, config: RegistryConfig) -> Self {
        Self {
            source: Box::new(source),
            resolver: LocaleResolver::with_fallback(config.fallback_locale.clone()),
            config,
            state: RwLock::new(RegistryState::default()),
            discovery: Mutex::new(()),
        }
    }

    /// Discovered registry over link-time registered plugins, with the
    /// configured plugins enabled.
    pub fn from_config(config: RegistryConfig) -> Self {
        let registry = Self::with_config(InventorySource, config);
        registry.discover();
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load plugins from the source. Only the first call has any effect.
    pub fn discover(&self) {
        let _discovery = self.discovery.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_discovered() {
            log::debug!("Plugins already discovered, skipping");
            return;
        }

        let descriptors = self.source.load();
        let mut state = self.write();
        let mut seen = HashSet::new();
        for descriptor in descriptors {
            if !seen.insert(descriptor.id().clone()) {
                log::warn!(
                    "Duplicate TTS plugin id '{}', keeping the first registration",
                    descriptor.id()
                );
                continue;
            }
            log::debug!("Discovered TTS plugin '{}'", descriptor.id());
            state.entries.push(RegistryEntry {
                descriptor,
                enabled: false,
            });
        }

        if state.entries.is_empty() {
            log::warn!("No TTS plugins were discovered");
        }

        for id in &self.config.enabled {
            match state.entry_mut(id.as_str()) {
                Ok(entry) => entry.enabled = true,
                Err(e) => log::warn!("Ignoring configured plugin: {e}"),
            }
        }

        state.discovered = true;
    }

    pub fn is_discovered(&self) -> bool {
        self.read().discovered
    }

    /// Plugin ids in discovery order.
    pub fn list_ids(&self, filter: ListFilter) -> Vec<PluginId> {
        self.read()
            .entries
            .iter()
            .filter(|entry| filter.accepts(entry.enabled))
            .map(|entry| entry.descriptor.id().clone())
            .collect()
    }

    pub fn enable(&self, id: &str) -> TTSResult<()> {
        self.set_enabled(id, true)
    }

    pub fn disable(&self, id: &str) -> TTSResult<()> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> TTSResult<()> {
        let mut state = self.write();
        let entry = state.entry_mut(id)?;
        if entry.enabled != enabled {
            log::debug!(
                "TTS plugin '{id}' {}",
                if enabled { "enabled" } else { "disabled" }
            );
            entry.enabled = enabled;
        }
        Ok(())
    }

    pub fn is_enabled(&self, id: &str) -> TTSResult<bool> {
        Ok(self.read().entry(id)?.enabled)
    }

    /// Descriptor of `id`, whether enabled or not.
    pub fn get_descriptor(&self, id: &str) -> TTSResult<PluginDescriptor> {
        Ok(self.read().entry(id)?.descriptor.clone())
    }

    /// Display name of `id` in `locale`.
    ///
    /// Never fails: unknown plugins and untranslated names fall back to the id.
    pub fn resolve_display_name(&self, id: &str, locale: &str) -> String {
        match self.read().entry(id) {
            Ok(entry) => entry.descriptor.display_name_with(&self.resolver, locale),
            Err(_) => {
                log::debug!("Display name requested for unknown plugin '{id}'");
                id.to_string()
            }
        }
    }

    /// Localized title of setting `key` of plugin `id`, resolved with this
    /// registry's fallback locale.
    pub fn setting_display_name(
        &self,
        id: &str,
        key: &str,
        locale: &str,
    ) -> TTSResult<Option<String>> {
        Ok(self
            .read()
            .entry(id)?
            .descriptor
            .setting_display_name_with(&self.resolver, key, locale))
    }

    /// Localized description of setting `key` of plugin `id`, if it has one.
    pub fn setting_description(
        &self,
        id: &str,
        key: &str,
        locale: &str,
    ) -> TTSResult<Option<String>> {
        Ok(self
            .read()
            .entry(id)?
            .descriptor
            .setting_description_with(&self.resolver, key, locale))
    }

    /// Display names keyed by plugin id, in discovery order.
    pub fn display_names(&self, locale: &str, filter: ListFilter) -> Vec<(PluginId, String)> {
        self.read()
            .entries
            .iter()
            .filter(|entry| filter.accepts(entry.enabled))
            .map(|entry| {
                (
                    entry.descriptor.id().clone(),
                    entry.descriptor.display_name_with(&self.resolver, locale),
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide registry over link-time registered plugins, discovered on
/// first access.
pub fn global_registry() -> &'static PluginRegistry {
    static REGISTRY: OnceLock<PluginRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| PluginRegistry::from_config(RegistryConfig::default()))
}
