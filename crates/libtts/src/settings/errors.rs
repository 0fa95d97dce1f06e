use crate::types::PluginId;
use std::fmt;

/// Why a single setting was rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingErrorKind {
    /// Declared by the specification but absent from the input
    Missing,
    /// Present in the input but not declared by the specification
    Unknown,
    WrongType {
        expected: String,
        found: &'static str,
    },
    /// Enum membership, numeric range or length violated
    Constraint(String),
    /// Valid on its own but inconsistent with another setting
    Incompatible(String),
    /// The settings value was produced for a different plugin
    ForeignPlugin { expected: PluginId, found: PluginId },
}

impl fmt::Display for SettingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingErrorKind::Missing => f.write_str("missing required setting"),
            SettingErrorKind::Unknown => f.write_str("unknown setting"),
            SettingErrorKind::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            SettingErrorKind::Constraint(msg) => f.write_str(msg),
            SettingErrorKind::Incompatible(msg) => f.write_str(msg),
            SettingErrorKind::ForeignPlugin { expected, found } => write!(
                f,
                "settings belong to plugin '{found}', expected '{expected}'"
            ),
        }
    }
}

/// One offending key together with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingError {
    /// Setting name; empty when the error concerns the settings as a whole
    pub key: String,
    pub kind: SettingErrorKind,
}

impl SettingError {
    pub fn new(key: impl Into<String>, kind: SettingErrorKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }

    pub fn whole(kind: SettingErrorKind) -> Self {
        Self::new(String::new(), kind)
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "settings: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.key, self.kind)
        }
    }
}

/// Complete list of defects found in one validation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsErrors(Vec<SettingError>);

impl SettingsErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SettingError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: SettingsErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingError> {
        self.0.iter()
    }

    /// Offending keys in reporting order.
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&SettingError> {
        self.0.iter().find(|e| e.key == key)
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), SettingsErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<SettingError>> for SettingsErrors {
    fn from(errors: Vec<SettingError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for SettingsErrors {
    type Item = SettingError;
    type IntoIter = std::vec::IntoIter<SettingError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for SettingsErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "  - {error}")?;
        }
        Ok(())
    }
}
