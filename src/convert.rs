//! URL Converter: rewrites outgoing URLs to encode a target language.
//!
//! `convert` handles the language marker itself (path segment or query
//! argument, per routing mode); `convert_content_url` additionally
//! translates the content slugs embedded in hierarchical paths, walking
//! the ancestor chain oldest-to-youngest so a renamed grandparent does
//! not shadow a correctly translated parent.

use crate::config::{LanguageSettings, RoutingMode};
use crate::i18n::{Language, LanguageRegistry};
use crate::linker::{read_link_map, SLUG_META_KEY};
use crate::request::RequestContext;
use crate::store::{ContentId, ContentStore};
use tracing::debug;

pub struct UrlConverter<'a> {
    settings: &'a LanguageSettings,
}

impl<'a> UrlConverter<'a> {
    pub fn new(settings: &'a LanguageSettings) -> Self {
        Self { settings }
    }

    /// Rewrite a URL so it encodes the target language.
    ///
    /// Converting twice to the same language is stable. With no default
    /// language configured, or in subdomain mode, the URL passes through
    /// unchanged.
    pub fn convert(&self, url: &str, target: &Language) -> String {
        let registry = LanguageRegistry::new(self.settings);
        let Some(default_lang) = registry.default_code() else {
            debug!("no default language configured, leaving URL untouched");
            return url.to_string();
        };
        let is_default = target.code() == default_lang;

        match self.settings.routing_mode {
            RoutingMode::QueryParam => {
                if is_default && !self.settings.default_lang_in_url {
                    remove_query_arg(url, crate::rewrite::LANG_QUERY_VAR)
                } else {
                    add_query_arg(url, crate::rewrite::LANG_QUERY_VAR, target.code())
                }
            }
            RoutingMode::PrefixPath => {
                let Some((base, rest)) = self.split_base(url) else {
                    return url.to_string();
                };
                if is_default && !self.settings.default_lang_in_url {
                    match self.leading_language(&registry, &rest) {
                        Some(segment) => {
                            let tail = &rest[segment.len()..];
                            let tail = tail.strip_prefix('/').unwrap_or(tail);
                            format!("{}{}", base, tail)
                        }
                        None => url.to_string(),
                    }
                } else {
                    match self.leading_language(&registry, &rest) {
                        Some(segment) if segment == target.code() => url.to_string(),
                        Some(segment) => {
                            format!("{}{}{}", base, target.code(), &rest[segment.len()..])
                        }
                        None => format!("{}{}/{}", base, target.code(), rest),
                    }
                }
            }
            RoutingMode::Subdomain => {
                debug!("subdomain routing is not implemented, leaving URL untouched");
                url.to_string()
            }
        }
    }

    /// Rewrite a content item's URL for the request's active language,
    /// translating every ancestor slug and the leaf slug before encoding
    /// the language marker itself.
    pub fn convert_content_url(
        &self,
        store: &dyn ContentStore,
        ctx: &mut RequestContext,
        url: &str,
        item_id: ContentId,
    ) -> String {
        let registry = LanguageRegistry::new(self.settings);
        let Some(item) = store.get_item(item_id) else {
            return self.convert(url, ctx.lang());
        };
        if !registry.is_enabled_content_type(&item.item_type) {
            return self.convert(url, ctx.lang());
        }

        let lang = ctx.lang().code().to_string();
        let mut url = url.to_string();

        // Oldest ancestor first, so a translated grandparent segment never
        // hides the parent's own replacement.
        for &ancestor in store.list_ancestors(item_id).iter().rev() {
            url = self.translate_slug_of(store, ctx, &lang, ancestor, url);
        }

        ctx.slug_cache.insert(item.id, item.slug.clone());
        url = self.translate_slug_of(store, ctx, &lang, item.id, url);

        self.convert(&url, ctx.lang())
    }

    /// Replace one item's slug segment with its translation in `lang`,
    /// when that translation exists and has a slug.
    fn translate_slug_of(
        &self,
        store: &dyn ContentStore,
        ctx: &mut RequestContext,
        lang: &str,
        id: ContentId,
        url: String,
    ) -> String {
        let link_map = read_link_map(store, id);
        let Some(&linked) = link_map.get(lang) else {
            return url;
        };

        let original = ctx
            .slug_cache
            .get_or_fetch(id, || store.get_item(id).map(|item| item.slug));
        let translated = ctx.slug_cache.get_or_fetch(linked, || {
            store
                .get_meta(linked, SLUG_META_KEY)
                .or_else(|| store.get_item(linked).map(|item| item.slug))
        });

        match (original, translated) {
            (Some(from), Some(to)) if !to.is_empty() && from != to => {
                replace_slug_segment(&url, &from, &to)
            }
            _ => url,
        }
    }

    /// Split a URL into the site base and the remainder. Absolute URLs are
    /// matched against `home_url`, site-relative ones against its path.
    fn split_base(&self, url: &str) -> Option<(String, String)> {
        let home = trailing_slashed(&self.settings.home_url);
        if let Some(rest) = url.strip_prefix(&home) {
            return Some((home, rest.to_string()));
        }
        if url == home.trim_end_matches('/') {
            return Some((home, String::new()));
        }
        let base = trailing_slashed(self.settings.home_path());
        if let Some(rest) = url.strip_prefix(&base) {
            return Some((base, rest.to_string()));
        }
        if url == base.trim_end_matches('/') && !url.is_empty() {
            return Some((base, String::new()));
        }
        None
    }

    /// The leading path segment of `rest` when it is an enabled language
    /// code, delimited by a slash, a query string or the end of input.
    fn leading_language(&self, registry: &LanguageRegistry, rest: &str) -> Option<String> {
        let segment: String = rest
            .chars()
            .take_while(|c| *c != '/' && *c != '?' && *c != '#')
            .collect();
        if segment.len() == 2 && registry.is_enabled(&segment) {
            Some(segment)
        } else {
            None
        }
    }
}

/// Add a query argument to a URL, replacing any existing value so the
/// operation is stable under repetition.
pub fn add_query_arg(url: &str, key: &str, value: &str) -> String {
    let url = remove_query_arg(url, key);
    if url.contains('?') {
        format!("{}&{}={}", url, key, value)
    } else {
        format!("{}?{}={}", trailing_slashed(&url), key, value)
    }
}

/// Remove a query argument from a URL, dropping the `?` when nothing is
/// left of the query string.
pub fn remove_query_arg(url: &str, key: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or(pair);
            !pair.is_empty() && name != key
        })
        .collect();
    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}

/// Replace a whole path segment, never a substring of a longer segment.
fn replace_slug_segment(url: &str, from: &str, to: &str) -> String {
    let mut result = url.replace(&format!("/{}/", from), &format!("/{}/", to));
    for boundary in ['?', '#'] {
        result = result.replace(
            &format!("/{}{}", from, boundary),
            &format!("/{}{}", to, boundary),
        );
    }
    if let Some(stripped) = result.strip_suffix(&format!("/{}", from)) {
        result = format!("{}/{}", stripped, to);
    }
    result
}

fn trailing_slashed(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    }
}

/// Encode slashes in a hierarchical name for safe query transport.
pub fn encode_slashes(value: &str) -> String {
    value.replace('/', "%2F")
}

/// Decode slashes previously encoded with [`encode_slashes`].
pub fn decode_slashes(value: &str) -> String {
    value.replace("%2F", "/")
}

/// The last segment of a hierarchical name value, as matched by a
/// generated-type rule ("za-nas%2Fteam-bg" gives "team-bg"). Dispatchers
/// query generated types by leaf slug.
pub fn hierarchical_leaf_slug(name: &str) -> String {
    let decoded = decode_slashes(name);
    decoded
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}
