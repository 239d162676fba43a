//! Per-request values: the incoming request shape the resolver consumes
//! and the context it produces.
//!
//! `RequestContext` carries the state that must not leak between requests
//! (active language, locale, slug cache): constructed at request start,
//! discarded at request end, never stored process-wide.

use crate::i18n::Language;
use crate::slug_cache::SlugCache;

/// The slice of an incoming HTTP request the engine cares about.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Request path, including the site base path (e.g. "/bg/about/")
    pub path: String,
    /// Parsed query arguments in order of appearance
    pub query: Vec<(String, String)>,
}

impl IncomingRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Parse a path-with-query string ("/about/?mlwp_lang=bg&x=1").
    pub fn from_path_and_query(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self {
                path: path.to_string(),
                query: parse_query(query),
            },
            None => Self::new(target),
        }
    }

    /// Builder-style query argument, mostly for tests.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// First value of a query argument, if present.
    pub fn query_arg(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Everything request-scoped the engine needs after resolution: the active
/// language, its locale tag, and the slug cache for URL conversion.
#[derive(Debug)]
pub struct RequestContext {
    lang: Language,
    locale: String,
    pub slug_cache: SlugCache,
}

impl RequestContext {
    pub fn new(lang: Language, locale: impl Into<String>) -> Self {
        Self {
            lang,
            locale: locale.into(),
            slug_cache: SlugCache::new(),
        }
    }

    /// The active language for this request.
    pub fn lang(&self) -> &Language {
        &self.lang
    }

    /// The active locale tag (e.g. "bg_BG").
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_and_query() {
        let request = IncomingRequest::from_path_and_query("/about/?mlwp_lang=bg&x=1");
        assert_eq!(request.path, "/about/");
        assert_eq!(request.query_arg("mlwp_lang"), Some("bg"));
        assert_eq!(request.query_arg("x"), Some("1"));
        assert_eq!(request.query_arg("missing"), None);
    }

    #[test]
    fn test_from_path_without_query() {
        let request = IncomingRequest::from_path_and_query("/about/");
        assert_eq!(request.path, "/about/");
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_valueless_query_arg() {
        let request = IncomingRequest::from_path_and_query("/?feed");
        assert_eq!(request.query_arg("feed"), Some(""));
    }

    #[test]
    fn test_context_starts_with_empty_cache() {
        let ctx = RequestContext::new(Language::fallback(), "en_US");
        assert_eq!(ctx.lang().code(), "en");
        assert_eq!(ctx.locale(), "en_US");
        assert!(ctx.slug_cache.is_empty());
    }
}
