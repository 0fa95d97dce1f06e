//! Locale parsing, message catalogues and display-string resolution.
//!
//! Plugins ship small in-code [`Catalogue`]s keyed by the English message id.
//! A [`LocaleResolver`] walks an ordered list of [`ResolutionStrategy`]s,
//! each proposing a candidate locale, and returns the first translation found.
//! The standard chain is exact match, language plus script, language only,
//! then a configured fallback locale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Locale used when nothing else matches
pub const DEFAULT_FALLBACK_LOCALE: &str = "en";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid locale identifier: '{0}'\nSuggestion: Use forms like 'en', 'en_US', 'zh-Hant-TW' or 'de_DE.UTF-8'")]
pub struct InvalidLocale(pub String);

/// Parsed locale identifier.
///
/// Accepts both POSIX (`en_CA`, `de_DE.UTF-8@euro`) and CLDR/BCP 47
/// (`zh-Hant-TW`, `ca-ES-valencia`) spellings and normalizes the casing of
/// every subtag. Displays in POSIX form (`zh_Hant_TW`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    script: Option<String>,
    region: Option<String>,
    variant: Option<String>,
}

impl Locale {
    pub fn parse(id: &str) -> Result<Self, InvalidLocale> {
        let invalid = || InvalidLocale(id.to_string());

        let (rest, modifier) = match id.trim().split_once('@') {
            Some((rest, modifier)) => (rest, Some(modifier)),
            None => (id.trim(), None),
        };
        let rest = rest.split_once('.').map_or(rest, |(rest, _encoding)| rest);

        let mut subtags = rest.split(['_', '-']);
        let language = subtags
            .next()
            .filter(|tag| (2..=3).contains(&tag.len()) && is_alpha(tag))
            .ok_or_else(invalid)?
            .to_ascii_lowercase();

        let mut locale = Self {
            language,
            script: None,
            region: None,
            variant: None,
        };

        for tag in subtags {
            if locale.script.is_none() && locale.region.is_none() && tag.len() == 4 && is_alpha(tag)
            {
                locale.script = Some(title_case(tag));
            } else if locale.region.is_none() && locale.variant.is_none() && is_region(tag) {
                locale.region = Some(tag.to_ascii_uppercase());
            } else if locale.variant.is_none() && is_variant(tag) {
                locale.variant = Some(tag.to_ascii_lowercase());
            } else {
                return Err(invalid());
            }
        }

        if let Some(modifier) = modifier.filter(|m| !m.is_empty()) {
            if locale.variant.is_some() || !modifier.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid());
            }
            locale.variant = Some(modifier.to_ascii_lowercase());
        }

        Ok(locale)
    }

    // Callers pass known-valid lowercase language codes
    fn bare(language: &str) -> Self {
        Self {
            language: language.to_string(),
            script: None,
            region: None,
            variant: None,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// The bare language, e.g. `kk` for `kk_Cyrl_KZ`.
    pub fn language_only(&self) -> Self {
        Self::bare(&self.language)
    }

    /// Language and script, e.g. `kk_Cyrl` for `kk_Cyrl_KZ`. `None` without a script.
    pub fn language_and_script(&self) -> Option<Self> {
        self.script.as_ref().map(|script| Self {
            language: self.language.clone(),
            script: Some(script.clone()),
            region: None,
            variant: None,
        })
    }
}

fn is_alpha(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_region(tag: &str) -> bool {
    (tag.len() == 2 && is_alpha(tag)) || (tag.len() == 3 && tag.chars().all(|c| c.is_ascii_digit()))
}

fn is_variant(tag: &str) -> bool {
    let alnum = tag.chars().all(|c| c.is_ascii_alphanumeric());
    let starts_with_digit = tag.chars().next().is_some_and(|c| c.is_ascii_digit());
    alnum && ((5..=8).contains(&tag.len()) || (tag.len() == 4 && starts_with_digit))
}

fn title_case(tag: &str) -> String {
    let lower = tag.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for part in [&self.script, &self.region, &self.variant]
            .into_iter()
            .flatten()
        {
            write!(f, "_{part}")?;
        }
        Ok(())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::bare(DEFAULT_FALLBACK_LOCALE)
    }
}

impl FromStr for Locale {
    type Err = InvalidLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = InvalidLocale;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_string()
    }
}

/// In-code message table of one plugin.
///
/// Messages are keyed by their English text (the message id), gettext style.
/// The source locale needs no table: any message id looked up in it
/// translates to itself.
#[derive(Clone, Debug)]
pub struct Catalogue {
    source: Locale,
    tables: HashMap<Locale, HashMap<String, String>>,
}

impl Catalogue {
    /// Catalogue whose message ids are written in `source`.
    pub fn new(source: Locale) -> Self {
        Self {
            source,
            tables: HashMap::new(),
        }
    }

    /// Add translations for `locale`, merging with any already present.
    /// Tables for invalid locale identifiers are dropped with an error log.
    pub fn with_translations(mut self, locale: &str, messages: &[(&str, &str)]) -> Self {
        let locale = match Locale::parse(locale) {
            Ok(locale) => locale,
            Err(e) => {
                log::error!("Dropping message table: {e}");
                return self;
            }
        };
        self.tables.entry(locale).or_default().extend(
            messages
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string())),
        );
        self
    }

    pub fn source_locale(&self) -> &Locale {
        &self.source
    }

    /// Locales with translations, the source locale first.
    pub fn locales(&self) -> Vec<&Locale> {
        let mut others: Vec<&Locale> = self.tables.keys().filter(|l| **l != self.source).collect();
        others.sort_by_key(|l| l.to_string());
        std::iter::once(&self.source).chain(others).collect()
    }

    /// Translation of `msgid` for exactly `locale`.
    pub fn lookup<'a>(&'a self, locale: &Locale, msgid: &'a str) -> Option<&'a str> {
        if let Some(text) = self
            .tables
            .get(locale)
            .and_then(|table| table.get(msgid))
            .map(String::as_str)
        {
            return Some(text);
        }
        (*locale == self.source).then_some(msgid)
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

/// One tier of the locale fallback chain.
pub trait ResolutionStrategy: Send + Sync + fmt::Debug {
    /// Locale to try for `requested`, which is `None` when the request could
    /// not be parsed.
    fn candidate(&self, requested: Option<&Locale>) -> Option<Locale>;
}

/// The requested locale as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl ResolutionStrategy for ExactMatch {
    fn candidate(&self, requested: Option<&Locale>) -> Option<Locale> {
        requested.cloned()
    }
}

/// Language and script without region
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptMatch;

impl ResolutionStrategy for ScriptMatch {
    fn candidate(&self, requested: Option<&Locale>) -> Option<Locale> {
        requested.and_then(Locale::language_and_script)
    }
}

/// Bare language
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageMatch;

impl ResolutionStrategy for LanguageMatch {
    fn candidate(&self, requested: Option<&Locale>) -> Option<Locale> {
        requested.map(Locale::language_only)
    }
}

/// A fixed locale, regardless of the request
#[derive(Debug, Clone)]
pub struct FallbackLocale(pub Locale);

impl ResolutionStrategy for FallbackLocale {
    fn candidate(&self, _requested: Option<&Locale>) -> Option<Locale> {
        Some(self.0.clone())
    }
}

/// Ordered chain of [`ResolutionStrategy`]s.
#[derive(Debug)]
pub struct LocaleResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl LocaleResolver {
    /// Resolver with no strategies at all.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Standard chain ending in `fallback`.
    pub fn with_fallback(fallback: Locale) -> Self {
        Self::empty()
            .with_strategy(ExactMatch)
            .with_strategy(ScriptMatch)
            .with_strategy(LanguageMatch)
            .with_strategy(FallbackLocale(fallback))
    }

    /// Append a tier at the end of the chain.
    pub fn with_strategy(mut self, strategy: impl ResolutionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Candidate locales for `requested`, in order, without duplicates.
    pub fn candidates(&self, requested: &str) -> Vec<Locale> {
        let parsed = match Locale::parse(requested) {
            Ok(locale) => Some(locale),
            Err(e) => {
                log::debug!("{e}");
                None
            }
        };
        let mut candidates: Vec<Locale> = Vec::with_capacity(self.strategies.len());
        for candidate in self
            .strategies
            .iter()
            .filter_map(|strategy| strategy.candidate(parsed.as_ref()))
        {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Best translation of `msgid` for `requested`, if any tier has one.
    pub fn resolve<'a>(
        &self,
        catalogue: &'a Catalogue,
        requested: &str,
        msgid: &'a str,
    ) -> Option<&'a str> {
        self.candidates(requested)
            .iter()
            .find_map(|locale| catalogue.lookup(locale, msgid))
    }
}

impl Default for LocaleResolver {
    fn default() -> Self {
        Self::with_fallback(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(id: &str) -> Locale {
        Locale::parse(id).unwrap()
    }

    fn catalogue() -> Catalogue {
        Catalogue::new(locale("en"))
            .with_translations("fr", &[("Voice", "Voix"), ("Speed", "Vitesse")])
            .with_translations("fr_CA", &[("Speed", "Débit")])
            .with_translations("sr_Latn", &[("Voice", "Glas")])
    }

    #[test]
    fn test_parse_posix_forms() {
        let l = locale("de_DE.UTF-8@euro");
        assert_eq!(l.language(), "de");
        assert_eq!(l.region(), Some("DE"));
        assert_eq!(l.variant(), Some("euro"));
        assert_eq!(locale("en_ca").to_string(), "en_CA");
    }

    #[test]
    fn test_parse_cldr_forms() {
        let l = locale("zh-hant-tw");
        assert_eq!(l.script(), Some("Hant"));
        assert_eq!(l.region(), Some("TW"));
        assert_eq!(l.to_string(), "zh_Hant_TW");

        let l = locale("ca-ES-valencia");
        assert_eq!(l.variant(), Some("valencia"));
        assert_eq!(locale("es-419").region(), Some("419"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for id in ["", "e", "english", "en_US_US_US", "12_US", "en__US"] {
            assert!(Locale::parse(id).is_err(), "{id} should be rejected");
        }
    }

    #[test]
    fn test_candidates_walk_the_chain() {
        let resolver = LocaleResolver::default();
        let candidates: Vec<String> = resolver
            .candidates("kk_Cyrl_KZ")
            .iter()
            .map(Locale::to_string)
            .collect();
        assert_eq!(candidates, vec!["kk_Cyrl_KZ", "kk_Cyrl", "kk", "en"]);

        let candidates: Vec<String> = resolver
            .candidates("en")
            .iter()
            .map(Locale::to_string)
            .collect();
        assert_eq!(candidates, vec!["en"]);
    }

    #[test]
    fn test_region_insensitive_translation() {
        let resolver = LocaleResolver::default();
        let catalogue = catalogue();
        for requested in ["fr", "fr_FR", "fr_BE", "fr-CH"] {
            assert_eq!(resolver.resolve(&catalogue, requested, "Voice"), Some("Voix"));
        }
        assert_eq!(resolver.resolve(&catalogue, "fr_CA", "Speed"), Some("Débit"));
        assert_eq!(resolver.resolve(&catalogue, "fr_FR", "Speed"), Some("Vitesse"));
    }

    #[test]
    fn test_script_tier_precedes_language_tier() {
        let resolver = LocaleResolver::default();
        assert_eq!(
            resolver.resolve(&catalogue(), "sr-Latn-RS", "Voice"),
            Some("Glas")
        );
    }

    #[test]
    fn test_falls_back_to_source_text() {
        let resolver = LocaleResolver::default();
        let catalogue = catalogue();
        assert_eq!(resolver.resolve(&catalogue, "ja_JP", "Voice"), Some("Voice"));
        assert_eq!(resolver.resolve(&catalogue, "not a locale", "Voice"), Some("Voice"));
        assert_eq!(resolver.resolve(&catalogue, "fr", "Unknown"), Some("Unknown"));
    }

    #[test]
    fn test_no_match_without_fallback() {
        let resolver = LocaleResolver::empty()
            .with_strategy(ExactMatch)
            .with_strategy(LanguageMatch);
        assert_eq!(resolver.resolve(&catalogue(), "ja", "Voice"), None);
    }

    #[test]
    fn test_locales_lists_source_first() {
        let locales: Vec<String> = catalogue().locales().iter().map(|l| l.to_string()).collect();
        assert_eq!(locales, vec!["en", "fr", "fr_CA", "sr_Latn"]);
    }

    #[test]
    fn test_locale_serde_as_string() {
        let l: Locale = serde_json::from_str("\"pt-br\"").unwrap();
        assert_eq!(serde_json::to_string(&l).unwrap(), "\"pt_BR\"");
        assert!(serde_json::from_str::<Locale>("\"?\"").is_err());
    }
}
