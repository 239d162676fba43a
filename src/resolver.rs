//! Locale Resolver: derives the active language from an incoming request.
//!
//! Runs once per request and always produces a language; every failure
//! path (unknown code, disabled language, unconfigured default,
//! unimplemented subdomain mode) falls back rather than erroring.

use crate::config::{LanguageSettings, RoutingMode};
use crate::i18n::{Language, LanguageRegistry};
use crate::request::{IncomingRequest, RequestContext};
use crate::rewrite::LANG_QUERY_VAR;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

static LANG_SEGMENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn lang_segment_regex() -> &'static Regex {
    LANG_SEGMENT_REGEX.get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("valid regex"))
}

pub struct LocaleResolver<'a> {
    settings: &'a LanguageSettings,
}

impl<'a> LocaleResolver<'a> {
    pub fn new(settings: &'a LanguageSettings) -> Self {
        Self { settings }
    }

    /// Resolve the active language and locale for a request.
    ///
    /// Total: always returns a context. When even the default language is
    /// unset, the hard-coded fallback applies and the locale degrades to
    /// the language code itself.
    pub fn resolve(&self, request: &IncomingRequest) -> RequestContext {
        let registry = LanguageRegistry::new(self.settings);
        let lang = self.resolve_language(&registry, request);
        let locale = registry
            .locale_of(lang.code())
            .map(str::to_string)
            .unwrap_or_else(|| lang.code().to_string());
        RequestContext::new(lang, locale)
    }

    fn resolve_language(
        &self,
        registry: &LanguageRegistry<'a>,
        request: &IncomingRequest,
    ) -> Language {
        match self.settings.routing_mode {
            RoutingMode::QueryParam => {
                if let Some(code) = request.query_arg(LANG_QUERY_VAR) {
                    if registry.is_enabled(code) {
                        return Language::unchecked(code);
                    }
                    debug!(code = %code, "language query argument not enabled, using default");
                }
                self.default_language(registry)
            }
            RoutingMode::PrefixPath => {
                if let Some(code) = self.path_language(request) {
                    if registry.is_enabled(&code) {
                        return Language::unchecked(code);
                    }
                    debug!(code = %code, "language path segment not enabled, using default");
                }
                self.default_language(registry)
            }
            RoutingMode::Subdomain => {
                debug!("subdomain routing is not implemented, using default language");
                self.default_language(registry)
            }
        }
    }

    /// First path segment after the site base, when it looks like a
    /// two-letter language code.
    fn path_language(&self, request: &IncomingRequest) -> Option<String> {
        let base = self.settings.home_path();
        let path = request.path.strip_prefix(base).unwrap_or(&request.path);
        let path = path.trim_start_matches('/');
        let segment = path.split('/').next().unwrap_or("");
        if lang_segment_regex().is_match(segment) {
            Some(segment.to_string())
        } else {
            None
        }
    }

    fn default_language(&self, registry: &LanguageRegistry<'a>) -> Language {
        Language::default_language(registry).unwrap_or_else(Language::fallback)
    }

    /// True when the request path is nothing but an enabled language code:
    /// the translated home page.
    pub fn is_language_only_request(&self, request: &IncomingRequest) -> bool {
        let registry = LanguageRegistry::new(self.settings);
        let base = self.settings.home_path();
        let path = request.path.strip_prefix(base).unwrap_or(&request.path);
        let path = path.trim_matches('/');
        registry.is_enabled(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::en_bg_settings;

    #[test]
    fn test_prefix_path_enabled_language() {
        let settings = en_bg_settings();
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/bg/about/"));
        assert_eq!(ctx.lang().code(), "bg");
        assert_eq!(ctx.locale(), "bg_BG");
    }

    #[test]
    fn test_prefix_path_no_language_segment() {
        let settings = en_bg_settings();
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/about/"));
        assert_eq!(ctx.lang().code(), "en");
        assert_eq!(ctx.locale(), "en_US");
    }

    #[test]
    fn test_prefix_path_disabled_language_falls_back() {
        let settings = en_bg_settings();
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/fr/about/"));
        assert_eq!(ctx.lang().code(), "en");
    }

    #[test]
    fn test_prefix_path_with_base_path() {
        let mut settings = en_bg_settings();
        settings.home_url = "http://example.com/blog/".to_string();
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/blog/bg/about/"));
        assert_eq!(ctx.lang().code(), "bg");
    }

    #[test]
    fn test_query_param_mode() {
        let mut settings = en_bg_settings();
        settings.routing_mode = RoutingMode::QueryParam;
        let resolver = LocaleResolver::new(&settings);

        let request = IncomingRequest::new("/about/").with_query(LANG_QUERY_VAR, "bg");
        assert_eq!(resolver.resolve(&request).lang().code(), "bg");

        let request = IncomingRequest::new("/about/").with_query(LANG_QUERY_VAR, "fr");
        assert_eq!(resolver.resolve(&request).lang().code(), "en");

        let request = IncomingRequest::new("/about/");
        assert_eq!(resolver.resolve(&request).lang().code(), "en");
    }

    #[test]
    fn test_query_param_ignored_in_prefix_mode() {
        let settings = en_bg_settings();
        let resolver = LocaleResolver::new(&settings);

        let request = IncomingRequest::new("/about/").with_query(LANG_QUERY_VAR, "bg");
        assert_eq!(resolver.resolve(&request).lang().code(), "en");
    }

    #[test]
    fn test_subdomain_mode_always_default() {
        let mut settings = en_bg_settings();
        settings.routing_mode = RoutingMode::Subdomain;
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/bg/about/"));
        assert_eq!(ctx.lang().code(), "en");
    }

    #[test]
    fn test_resolution_is_total_without_default() {
        let mut settings = en_bg_settings();
        settings.default_lang = None;
        settings.enabled_langs.clear();
        let resolver = LocaleResolver::new(&settings);

        for target in ["/", "", "/bg/about/", "/..//x", "/fr/"] {
            let ctx = resolver.resolve(&IncomingRequest::new(target));
            assert!(!ctx.lang().code().is_empty(), "no language for {:?}", target);
        }
    }

    #[test]
    fn test_fallback_locale_degrades_to_code() {
        let mut settings = en_bg_settings();
        settings.default_lang = None;
        settings.enabled_langs.clear();
        settings.languages.clear();
        let resolver = LocaleResolver::new(&settings);

        let ctx = resolver.resolve(&IncomingRequest::new("/"));
        assert_eq!(ctx.lang().code(), "en");
        assert_eq!(ctx.locale(), "en");
    }

    #[test]
    fn test_is_language_only_request() {
        let settings = en_bg_settings();
        let resolver = LocaleResolver::new(&settings);

        assert!(resolver.is_language_only_request(&IncomingRequest::new("/bg")));
        assert!(resolver.is_language_only_request(&IncomingRequest::new("/bg/")));
        assert!(!resolver.is_language_only_request(&IncomingRequest::new("/bg/about/")));
        assert!(!resolver.is_language_only_request(&IncomingRequest::new("/fr/")));
        assert!(!resolver.is_language_only_request(&IncomingRequest::new("/")));
    }
}
