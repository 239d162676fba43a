//! Language registry: lookup surface over the configured language catalogue.
//!
//! The registry is a read-only view of [`LanguageSettings`]. It answers the
//! questions the routing and linking code asks on every request: is this
//! language enabled, is this content type translated, which languages are
//! active and in what display order.

use crate::config::LanguageSettings;
use serde::{Deserialize, Serialize};

/// Configuration for a single supported language.
///
/// Loaded from the persisted settings document; immutable for the lifetime
/// of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g. "en", "bg")
    pub code: String,

    /// Full locale tag (e.g. "en_US", "bg_BG")
    pub locale: String,

    /// Display label, usually in the language itself (e.g. "Български")
    pub label: String,

    /// Flag icon file name shown next to the label
    #[serde(default)]
    pub flag_icon: String,

    /// Message shown when an item has no translation in this language
    #[serde(default)]
    pub na_message: String,

    /// Date format override; empty means the site default
    #[serde(default)]
    pub date_format: String,

    /// Time format override; empty means the site default
    #[serde(default)]
    pub time_format: String,

    /// Position in display listings, lower comes first
    #[serde(default)]
    pub order: i32,
}

/// Read-only lookup view over [`LanguageSettings`].
///
/// Cheap to construct; borrow one wherever language checks are needed
/// instead of threading the whole settings document around.
pub struct LanguageRegistry<'a> {
    settings: &'a LanguageSettings,
}

impl<'a> LanguageRegistry<'a> {
    pub fn new(settings: &'a LanguageSettings) -> Self {
        Self { settings }
    }

    /// Get a language configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language is known
    /// * `None` if it is not; callers treat this as "inactive language,
    ///   fall back to the default"
    pub fn get(&self, code: &str) -> Option<&'a LanguageConfig> {
        self.settings.languages.get(code)
    }

    /// Check whether a language code is currently enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.settings.enabled_langs.contains(code)
    }

    /// Check whether a content type participates in translation.
    pub fn is_enabled_content_type(&self, type_name: &str) -> bool {
        self.settings.enabled_content_types.contains(type_name)
    }

    /// Check whether a type name is one of the derived per-language types.
    pub fn is_generated_content_type(&self, type_name: &str) -> bool {
        self.settings.generated_content_types.contains(type_name)
    }

    /// The configured default language code, if one is set.
    pub fn default_code(&self) -> Option<&'a str> {
        self.settings.default_lang.as_deref()
    }

    /// All enabled languages, sorted by their `order` field.
    ///
    /// Codes that are enabled but missing from the catalogue are skipped;
    /// settings validation rejects that state on load, so this only matters
    /// for hand-built settings in tests.
    pub fn list_enabled(&self) -> Vec<&'a LanguageConfig> {
        let mut langs: Vec<&LanguageConfig> = self
            .settings
            .enabled_langs
            .iter()
            .filter_map(|code| self.settings.languages.get(code))
            .collect();
        langs.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.code.cmp(&b.code)));
        langs
    }

    /// The locale tag for a language code, when known.
    pub fn locale_of(&self, code: &str) -> Option<&'a str> {
        self.get(code).map(|lang| lang.locale.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::en_bg_settings;

    #[test]
    fn test_get_known_language() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let config = registry.get("bg").expect("bg should be configured");
        assert_eq!(config.code, "bg");
        assert_eq!(config.locale, "bg_BG");
        assert_eq!(config.label, "Български");
    }

    #[test]
    fn test_get_unknown_language() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);
        assert!(registry.get("fr").is_none());
    }

    #[test]
    fn test_is_enabled() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        assert!(registry.is_enabled("en"));
        assert!(registry.is_enabled("bg"));
        assert!(!registry.is_enabled("fr"));
        assert!(!registry.is_enabled(""));
    }

    #[test]
    fn test_is_enabled_content_type() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        assert!(registry.is_enabled_content_type("page"));
        assert!(registry.is_enabled_content_type("post"));
        assert!(!registry.is_enabled_content_type("attachment"));
    }

    #[test]
    fn test_is_generated_content_type() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        assert!(registry.is_generated_content_type("generated_page_bg"));
        assert!(registry.is_generated_content_type("generated_post_en"));
        assert!(!registry.is_generated_content_type("page"));
        assert!(!registry.is_generated_content_type("generated_page_fr"));
    }

    #[test]
    fn test_list_enabled_sorted_by_order() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);

        let enabled = registry.list_enabled();
        assert_eq!(enabled.len(), 2);
        // en has order 0, bg has order 10
        assert_eq!(enabled[0].code, "en");
        assert_eq!(enabled[1].code, "bg");
    }

    #[test]
    fn test_list_enabled_skips_missing_catalogue_entry() {
        let mut settings = en_bg_settings();
        settings.enabled_langs.insert("fr".to_string());
        let registry = LanguageRegistry::new(&settings);

        let enabled = registry.list_enabled();
        assert_eq!(enabled.len(), 2);
        assert!(enabled.iter().all(|lang| lang.code != "fr"));
    }

    #[test]
    fn test_default_code() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);
        assert_eq!(registry.default_code(), Some("en"));
    }

    #[test]
    fn test_locale_of() {
        let settings = en_bg_settings();
        let registry = LanguageRegistry::new(&settings);
        assert_eq!(registry.locale_of("en"), Some("en_US"));
        assert_eq!(registry.locale_of("xx"), None);
    }
}
