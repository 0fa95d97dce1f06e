//! Settings for the Kokoro plugin

use crate::settings::{SettingError, SettingErrorKind, SettingsErrors, SettingsModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default HuggingFace repository of the Kokoro model
pub const DEFAULT_REPO_ID: &str = "hexgrad/Kokoro-82M";

/// Locales Kokoro can speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum KokoroLocale {
    #[default]
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "en_GB")]
    EnGb,
    #[serde(rename = "fr_FR")]
    FrFr,
}

impl KokoroLocale {
    pub const ALL: [KokoroLocale; 3] = [KokoroLocale::EnUs, KokoroLocale::EnGb, KokoroLocale::FrFr];

    pub fn as_str(&self) -> &'static str {
        match self {
            KokoroLocale::EnUs => "en_US",
            KokoroLocale::EnGb => "en_GB",
            KokoroLocale::FrFr => "fr_FR",
        }
    }

    /// Kokoro pipeline language code, e.g. `a` for American English
    pub fn lang_code(&self) -> char {
        match self {
            KokoroLocale::EnUs => 'a',
            KokoroLocale::EnGb => 'b',
            KokoroLocale::FrFr => 'f',
        }
    }
}

impl fmt::Display for KokoroLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KokoroLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KokoroLocale::ALL
            .into_iter()
            .find(|locale| locale.as_str() == s)
            .ok_or_else(|| format!("Unsupported Kokoro locale: {}", s))
    }
}

/// Built-in Kokoro voices. The first letter of each name is the language
/// code of the locale it speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum KokoroVoice {
    #[default]
    AfHeart,
    AfBella,
    AfNicole,
    AmFenrir,
    AmMichael,
    AmPuck,
    BfEmma,
    BmFable,
    BmGeorge,
    FfSiwis,
}

impl KokoroVoice {
    pub const ALL: [KokoroVoice; 10] = [
        KokoroVoice::AfHeart,
        KokoroVoice::AfBella,
        KokoroVoice::AfNicole,
        KokoroVoice::AmFenrir,
        KokoroVoice::AmMichael,
        KokoroVoice::AmPuck,
        KokoroVoice::BfEmma,
        KokoroVoice::BmFable,
        KokoroVoice::BmGeorge,
        KokoroVoice::FfSiwis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KokoroVoice::AfHeart => "af_heart",
            KokoroVoice::AfBella => "af_bella",
            KokoroVoice::AfNicole => "af_nicole",
            KokoroVoice::AmFenrir => "am_fenrir",
            KokoroVoice::AmMichael => "am_michael",
            KokoroVoice::AmPuck => "am_puck",
            KokoroVoice::BfEmma => "bf_emma",
            KokoroVoice::BmFable => "bm_fable",
            KokoroVoice::BmGeorge => "bm_george",
            KokoroVoice::FfSiwis => "ff_siwis",
        }
    }

    pub fn lang_code(&self) -> char {
        match self {
            KokoroVoice::AfHeart
            | KokoroVoice::AfBella
            | KokoroVoice::AfNicole
            | KokoroVoice::AmFenrir
            | KokoroVoice::AmMichael
            | KokoroVoice::AmPuck => 'a',
            KokoroVoice::BfEmma | KokoroVoice::BmFable | KokoroVoice::BmGeorge => 'b',
            KokoroVoice::FfSiwis => 'f',
        }
    }
}

impl fmt::Display for KokoroVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KokoroVoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KokoroVoice::ALL
            .into_iter()
            .find(|voice| voice.as_str() == s)
            .ok_or_else(|| format!("Unknown Kokoro voice: {}", s))
    }
}

/// Compute device for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum KokoroDevice {
    Cpu,
    Cuda,
}

impl fmt::Display for KokoroDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KokoroDevice::Cpu => f.write_str("cpu"),
            KokoroDevice::Cuda => f.write_str("cuda"),
        }
    }
}

/// Settings of the Kokoro backend.
///
/// Local paths are only needed for offline or air-gapped use and are not
/// checked here; they must exist when the backend starts. When `voice_path`
/// is set it takes precedence over `voice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct KokoroSettings {
    #[schemars(
        title = "Locale",
        description = "The regional or international locale setting."
    )]
    pub locale: KokoroLocale,

    #[schemars(
        title = "Voice",
        description = "The voice used by the text-to-speech system."
    )]
    pub voice: KokoroVoice,

    #[schemars(
        title = "Speed",
        description = "The speaking speed of the text-to-speech system."
    )]
    #[schemars(range(min = 0.1, max = 2.0))]
    pub speed: f64,

    // None picks a GPU when present, with the CPU as fallback
    #[schemars(
        title = "Compute Device",
        description = "The device used for running the TTS system (e.g., cpu or cuda)."
    )]
    pub device: Option<KokoroDevice>,

    #[schemars(
        title = "Repository ID",
        description = "The identifier or path of the Kokoro TTS HuggingFace repository."
    )]
    #[schemars(length(min = 1))]
    pub repo_id: String,

    #[schemars(
        title = "Model File Path",
        description = "The file path to the Kokoro TTS model file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically."
    )]
    pub model_path: Option<PathBuf>,

    #[schemars(
        title = "Configuration File Path",
        description = "The file path to the Kokoro TTS configuration file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically."
    )]
    pub config_path: Option<PathBuf>,

    #[schemars(
        title = "Voice File Path",
        description = "The file path to the Kokoro TTS voice file. Required only for offline or air-gapped use; otherwise, files are downloaded and cached automatically."
    )]
    pub voice_path: Option<PathBuf>,
}

impl Default for KokoroSettings {
    fn default() -> Self {
        Self {
            locale: KokoroLocale::default(),
            voice: KokoroVoice::default(),
            speed: 1.0,
            device: None,
            repo_id: DEFAULT_REPO_ID.to_string(),
            model_path: None,
            config_path: None,
            voice_path: None,
        }
    }
}

impl KokoroSettings {
    /// Pipeline language code for the configured locale
    pub fn lang_code(&self) -> char {
        self.locale.lang_code()
    }
}

impl SettingsModel for KokoroSettings {
    fn check(&self) -> Result<(), SettingsErrors> {
        if self.voice.lang_code() != self.lang_code() {
            return Err(SettingsErrors::from(vec![SettingError::new(
                "voice",
                SettingErrorKind::Incompatible(format!(
                    "voice '{}' does not speak locale '{}'; voices for it start with '{}'",
                    self.voice,
                    self.locale,
                    self.lang_code()
                )),
            )]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingKind;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = KokoroSettings::default();
        assert_eq!(settings.locale, KokoroLocale::EnUs);
        assert_eq!(settings.voice, KokoroVoice::AfHeart);
        assert_eq!(settings.speed, 1.0);
        assert_eq!(settings.repo_id, "hexgrad/Kokoro-82M");
        assert!(settings.check().is_ok());
    }

    #[test]
    fn test_to_dict_shape() {
        let dict = KokoroSettings::default().to_dict();
        assert_eq!(dict.get("locale"), Some(&json!("en_US")));
        assert_eq!(dict.get("voice"), Some(&json!("af_heart")));
        assert_eq!(dict.get("device"), Some(&json!(null)));
        assert_eq!(dict.get("model_path"), Some(&json!(null)));
        assert_eq!(dict.len(), 8);
    }

    #[test]
    fn test_specification() {
        let spec = KokoroSettings::specification();
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(
            names,
            vec![
                "locale",
                "voice",
                "speed",
                "device",
                "repo_id",
                "model_path",
                "config_path",
                "voice_path"
            ]
        );

        let locale = spec.get("locale").unwrap();
        assert_eq!(locale.kind, SettingKind::Enum);
        assert_eq!(
            locale.values.as_deref(),
            Some(&["en_US".to_string(), "en_GB".to_string(), "fr_FR".to_string()][..])
        );
        assert_eq!(spec.get("voice").unwrap().values.as_ref().map(Vec::len), Some(10));

        let speed = spec.get("speed").unwrap();
        assert_eq!((speed.min, speed.max), (Some(0.1), Some(2.0)));
        assert_eq!(speed.label(), "Speed");

        let device = spec.get("device").unwrap();
        assert!(device.nullable);
        assert_eq!(device.label(), "Compute Device");

        assert_eq!(spec.get("model_path").unwrap().kind, SettingKind::String);
    }

    #[test]
    fn test_voice_must_match_locale() {
        let mut dict = KokoroSettings::default().to_dict();
        dict.insert("locale".to_string(), json!("fr_FR"));
        let errors = KokoroSettings::from_dict(&dict).unwrap_err();
        assert_eq!(errors.keys(), vec!["voice"]);

        dict.insert("voice".to_string(), json!("ff_siwis"));
        let settings = KokoroSettings::from_dict(&dict).unwrap();
        assert_eq!(settings.lang_code(), 'f');
    }

    #[test]
    fn test_rejects_out_of_range_speed_and_unknown_voice() {
        let mut dict = KokoroSettings::default().to_dict();
        dict.insert("speed".to_string(), json!(2.5));
        dict.insert("voice".to_string(), json!("zz_nobody"));
        dict.insert("pitch".to_string(), json!(1));
        let errors = KokoroSettings::from_dict(&dict).unwrap_err();
        assert_eq!(errors.keys(), vec!["voice", "speed", "pitch"]);
    }

    #[test]
    fn test_paths_are_not_checked_at_validation() {
        let mut dict = KokoroSettings::default().to_dict();
        dict.insert("model_path".to_string(), json!("/nowhere/kokoro.pth"));
        let settings = KokoroSettings::from_dict(&dict).unwrap();
        assert_eq!(settings.model_path, Some(PathBuf::from("/nowhere/kokoro.pth")));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("en_GB".parse::<KokoroLocale>().unwrap(), KokoroLocale::EnGb);
        assert!("en-GB".parse::<KokoroLocale>().is_err());
        assert_eq!("bm_george".parse::<KokoroVoice>().unwrap(), KokoroVoice::BmGeorge);
        assert!(KokoroVoice::ALL.iter().all(|v| v.as_str().starts_with(v.lang_code())));
    }
}
