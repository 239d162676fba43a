//! Language type: a validated handle to an enabled language.
//!
//! A `Language` can only be constructed for a code that is present in the
//! registry and enabled, so downstream code (URL conversion, translation
//! linking) never has to re-check validity.

use crate::i18n::LanguageRegistry;
use anyhow::{bail, Result};
use std::fmt;

/// A validated, enabled language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    code: String,
}

impl Language {
    /// Create a Language from a language code string.
    ///
    /// # Arguments
    /// * `registry` - The registry to validate against
    /// * `code` - The ISO 639-1 language code (e.g. "en", "bg")
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is known and the language is enabled
    /// * `Err` if the code is unknown or the language is disabled
    pub fn from_code(registry: &LanguageRegistry, code: &str) -> Result<Language> {
        match registry.get(code) {
            Some(config) if registry.is_enabled(code) => Ok(Language {
                code: config.code.clone(),
            }),
            Some(_) => bail!("language '{}' is not enabled", code),
            None => bail!("unknown language code: '{}'", code),
        }
    }

    /// The configured default language, if one is set and enabled.
    pub fn default_language(registry: &LanguageRegistry) -> Option<Language> {
        registry
            .default_code()
            .and_then(|code| Language::from_code(registry, code).ok())
    }

    /// The hard-coded ultimate fallback used when no default language is
    /// configured. Resolution must always produce a language (see the
    /// Locale Resolver), so this bypasses registry validation.
    pub fn fallback() -> Language {
        Language {
            code: "en".to_string(),
        }
    }

    /// Construct without validation. Only for the resolver, which has
    /// already checked the code against the registry.
    pub(crate) fn unchecked(code: impl Into<String>) -> Language {
        Language { code: code.into() }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::en_bg_settings;

    #[test]
    fn test_from_code_enabled() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let bg = Language::from_code(&registry, "bg").expect("bg is enabled");
        assert_eq!(bg.code(), "bg");
    }

    #[test]
    fn test_from_code_unknown() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let result = Language::from_code(&registry, "fr");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown"));
    }

    #[test]
    fn test_from_code_disabled() {
        let mut settings = en_bg_settings();
        settings.enabled_langs.remove("bg");
        let registry = LanguageRegistry::new(&settings);

        let result = Language::from_code(&registry, "bg");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not enabled"));
    }

    #[test]
    fn test_default_language() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let default = Language::default_language(&registry).expect("default is set");
        assert_eq!(default.code(), "en");
    }

    #[test]
    fn test_default_language_unset() {
        let mut settings = en_bg_settings();
        settings.default_lang = None;
        let registry = LanguageRegistry::new(&settings);

        assert!(Language::default_language(&registry).is_none());
    }

    #[test]
    fn test_fallback() {
        assert_eq!(Language::fallback().code(), "en");
    }

    #[test]
    fn test_equality_and_display() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let a = Language::from_code(&registry, "en").unwrap();
        let b = Language::from_code(&registry, "en").unwrap();
        assert_eq!(a, b);
        assert_eq!(format!("{}", a), "en");
    }
}
