//! Typed, validated and serializable backend settings.
//!
//! A plugin declares its tunable parameters as a plain struct implementing
//! [`SettingsModel`]. From that single declaration the crate derives:
//!
//! - the [`SettingsSpecification`] (through the struct's JSON schema), used for
//!   validation and for building configuration UIs before any settings exist;
//! - the flat dictionary representation used for persistence ([`SettingsDict`]);
//! - the type-erased [`Settings`] value object that callers pass around without
//!   knowing the concrete backend.
//!
//! Dictionary validation reports every offending key at once rather than
//! stopping at the first one.

mod errors;
mod spec;
mod validate;

pub use errors::{SettingError, SettingErrorKind, SettingsErrors};
pub use spec::{SettingKind, SettingSpec, SettingsSpecification};

use crate::error::{TTSError, TTSResult};
use crate::types::PluginId;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Flat mapping from setting name to a JSON primitive.
pub type SettingsDict = Map<String, Value>;

/// Declared shape of one plugin's settings.
///
/// Implementors are ordinary serde structs. Defaults come from [`Default`],
/// per-field constraints from `#[schemars(...)]` attributes, and anything that
/// spans several fields from [`SettingsModel::check`].
///
/// Implementors should use `#[serde(deny_unknown_fields)]` and keep every field
/// a primitive, an optional primitive, or a unit-variant enum.
pub trait SettingsModel:
    Clone + PartialEq + Default + Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static
{
    /// Cross-field validation, run after every field passed its own checks.
    fn check(&self) -> Result<(), SettingsErrors> {
        Ok(())
    }

    /// Specification generated from the struct declaration.
    fn specification() -> SettingsSpecification {
        SettingsSpecification::of::<Self>()
    }

    /// Export as a flat dictionary of primitives.
    fn to_dict(&self) -> SettingsDict {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                log::error!("Settings serialized to a non-object value: {other}");
                SettingsDict::new()
            }
            Err(e) => {
                log::error!("Settings could not be serialized: {e}");
                SettingsDict::new()
            }
        }
    }

    /// Build from a dictionary that must match the specification exactly.
    fn from_dict(dict: &SettingsDict) -> Result<Self, SettingsErrors> {
        validate::from_dict::<Self>(&Self::specification(), dict)
    }
}

/// Backend-agnostic settings value.
///
/// Holds the normalized dictionary form of a plugin's settings model together
/// with the id of the plugin it belongs to. Cheap to clone; two values are equal
/// when they belong to the same plugin and hold the same values.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    plugin: PluginId,
    values: SettingsDict,
}

impl Settings {
    /// Wrap a validated model.
    pub fn from_model<S: SettingsModel>(plugin: impl Into<PluginId>, model: &S) -> Self {
        Self {
            plugin: plugin.into(),
            values: model.to_dict(),
        }
    }

    /// Validate `dict` against `S` and wrap the result.
    pub fn from_dict<S: SettingsModel>(
        plugin: impl Into<PluginId>,
        dict: &SettingsDict,
    ) -> TTSResult<Self> {
        let model = S::from_dict(dict).map_err(TTSError::InvalidSettings)?;
        Ok(Self::from_model(plugin, &model))
    }

    /// Re-validate into the typed model of `plugin`.
    ///
    /// Settings may have crossed a storage or process boundary since they were
    /// created, so they are never trusted as-is.
    pub fn to_model<S: SettingsModel>(&self, plugin: &PluginId) -> TTSResult<S> {
        if &self.plugin != plugin {
            return Err(TTSError::InvalidSettings(SettingsErrors::from(vec![
                SettingError::whole(SettingErrorKind::ForeignPlugin {
                    expected: plugin.clone(),
                    found: self.plugin.clone(),
                }),
            ])));
        }
        S::from_dict(&self.values).map_err(TTSError::InvalidSettings)
    }

    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Export as a flat dictionary of primitives. Never fails.
    pub fn to_dict(&self) -> SettingsDict {
        self.values.clone()
    }

    /// Export as a JSON object string.
    pub fn to_json(&self) -> TTSResult<String> {
        Ok(serde_json::to_string(&self.values)?)
    }
}

/// Parse a JSON object into a settings dictionary.
pub fn dict_from_json(json: &str) -> TTSResult<SettingsDict> {
    Ok(serde_json::from_str(json)?)
}
