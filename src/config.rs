//! Process-wide language settings: the persisted settings document.
//!
//! Loaded once at process start (or on an administrative save) and treated
//! as read-mostly afterwards. Per-request state lives in
//! [`crate::request::RequestContext`], never here.

use crate::i18n::LanguageConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Prefix for the derived per-language content types
/// (`generated_<type>_<lang>`).
pub const GENERATED_TYPE_PREFIX: &str = "generated_";

/// Strategy used to encode the active language in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Language as the first path segment after the site base (`/bg/about/`)
    PrefixPath,
    /// Language as a query argument (`?mlwp_lang=bg`)
    QueryParam,
    /// Language as a subdomain. Not implemented; behaves as the default
    /// language everywhere it is consulted.
    Subdomain,
}

/// The whole persisted configuration surface of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSettings {
    /// Language catalogue, keyed by code
    pub languages: BTreeMap<String, LanguageConfig>,

    /// Default language code; `None` means routing is not yet configured
    /// and every operation degrades to pass-through
    pub default_lang: Option<String>,

    /// Codes of the languages currently enabled
    pub enabled_langs: BTreeSet<String>,

    /// Active URL strategy
    pub routing_mode: RoutingMode,

    /// Whether the default language is encoded in URLs too
    pub default_lang_in_url: bool,

    /// Content types that participate in translation
    pub enabled_content_types: BTreeSet<String>,

    /// Derived per-language types, recomputed from the two sets above.
    /// Never edited by hand.
    #[serde(default)]
    pub generated_content_types: BTreeSet<String>,

    /// Site base URL; everything the URL converter touches is matched
    /// against this
    pub home_url: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        let mut languages = BTreeMap::new();
        languages.insert(
            "en".to_string(),
            LanguageConfig {
                code: "en".to_string(),
                locale: "en_US".to_string(),
                label: "English".to_string(),
                flag_icon: "united-states.png".to_string(),
                na_message: "Sorry, but this article is not available in English.".to_string(),
                date_format: String::new(),
                time_format: String::new(),
                order: 0,
            },
        );
        languages.insert(
            "bg".to_string(),
            LanguageConfig {
                code: "bg".to_string(),
                locale: "bg_BG".to_string(),
                label: "Български".to_string(),
                flag_icon: "bulgaria.png".to_string(),
                na_message: "Sorry, but this article is not available in Bulgarian.".to_string(),
                date_format: String::new(),
                time_format: String::new(),
                order: 10,
            },
        );

        Self {
            languages,
            default_lang: None,
            enabled_langs: BTreeSet::new(),
            routing_mode: RoutingMode::QueryParam,
            default_lang_in_url: false,
            enabled_content_types: ["post", "page"].iter().map(|s| s.to_string()).collect(),
            generated_content_types: BTreeSet::new(),
            home_url: "http://localhost/".to_string(),
        }
    }
}

impl LanguageSettings {
    /// Parse a settings document from a JSON string, validate it and derive
    /// the generated content types.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut settings: LanguageSettings =
            serde_json::from_str(json).context("Failed to parse language settings document")?;
        settings.validate()?;
        settings.recompute_generated_types();
        Ok(settings)
    }

    /// Load a settings document from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check the invariants an administrative save must keep.
    ///
    /// * every enabled code exists in the catalogue
    /// * the default language, when set, is enabled
    pub fn validate(&self) -> Result<()> {
        for code in &self.enabled_langs {
            if !self.languages.contains_key(code) {
                bail!("enabled language '{}' is missing from the catalogue", code);
            }
        }
        if let Some(default) = &self.default_lang {
            if !self.enabled_langs.contains(default) {
                bail!("default language '{}' is not enabled", default);
            }
        }
        Ok(())
    }

    /// The name of the derived type for a content type and language pair.
    pub fn generated_type_name(&self, type_name: &str, lang: &str) -> String {
        format!("{}{}_{}", GENERATED_TYPE_PREFIX, type_name, lang)
    }

    /// Recompute `generated_content_types` from the enabled sets.
    ///
    /// Must be called whenever `enabled_content_types` or `enabled_langs`
    /// changes; loading does it automatically.
    pub fn recompute_generated_types(&mut self) {
        let mut generated = BTreeSet::new();
        for type_name in &self.enabled_content_types {
            for lang in &self.enabled_langs {
                generated.insert(self.generated_type_name(type_name, lang));
            }
        }
        self.generated_content_types = generated;
    }

    /// The path component of `home_url`, used when converting
    /// site-relative URLs.
    pub fn home_path(&self) -> &str {
        let url = &self.home_url;
        let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
        match url[after_scheme..].find('/') {
            Some(i) => &url[after_scheme + i..],
            None => "/",
        }
    }
}

/// Shared test fixture: en (default, order 0) and bg (order 10) enabled,
/// prefix-path routing, posts and pages translated.
#[cfg(test)]
pub(crate) fn en_bg_settings() -> LanguageSettings {
    let mut settings = LanguageSettings {
        default_lang: Some("en".to_string()),
        enabled_langs: ["en", "bg"].iter().map(|s| s.to_string()).collect(),
        routing_mode: RoutingMode::PrefixPath,
        home_url: "http://example.com/".to_string(),
        ..LanguageSettings::default()
    };
    settings.recompute_generated_types();
    settings
}
