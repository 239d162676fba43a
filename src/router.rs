//! The `LanguageRouter` contract and its default implementation.
//!
//! Hosts program against the trait and inject an implementation; swapping
//! behavior is composition, not subclass override. `DefaultLanguageRouter`
//! wires the registry, resolver, rule builder, converter and linker
//! together over one owned settings document.

use crate::config::LanguageSettings;
use crate::convert::UrlConverter;
use crate::i18n::Language;
use crate::linker::{self, LinkMap, TranslationLinker};
use crate::request::{IncomingRequest, RequestContext};
use crate::resolver::LocaleResolver;
use crate::rewrite::{RewriteRule, RuleBuilder};
use crate::slug_cache::SlugCache;
use crate::store::{ContentId, ContentStore, StoreError};
use anyhow::Result;

/// The routing engine surface a host dispatcher talks to.
pub trait LanguageRouter {
    /// Derive the request's language and locale; runs once per request.
    fn resolve(&self, request: &IncomingRequest) -> RequestContext;

    /// Contribute language-aware rewrite rules; at most once per cycle.
    fn augment_rules(&mut self, rules: Vec<RewriteRule>) -> Vec<RewriteRule>;

    /// Start a new rule-generation cycle.
    fn reset_rule_cycle(&mut self);

    /// Encode a target language into an outgoing URL.
    fn convert_url(&self, url: &str, target: &Language) -> String;

    /// Encode the active language into a content URL, translating the
    /// slugs embedded in hierarchical paths.
    fn convert_content_url(
        &self,
        store: &dyn ContentStore,
        ctx: &mut RequestContext,
        url: &str,
        item_id: ContentId,
    ) -> String;

    /// Complete a canonical item's translation family.
    fn ensure_translations(
        &self,
        store: &mut dyn ContentStore,
        cache: &mut SlugCache,
        canonical_id: ContentId,
    ) -> Result<LinkMap>;
}

/// Default composition of the engine's components.
pub struct DefaultLanguageRouter {
    settings: LanguageSettings,
    builder: RuleBuilder,
}

impl DefaultLanguageRouter {
    pub fn new(mut settings: LanguageSettings) -> Self {
        settings.recompute_generated_types();
        Self {
            settings,
            builder: RuleBuilder::new(),
        }
    }

    pub fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    /// Replace the settings document after an administrative save and
    /// start a fresh rule cycle.
    pub fn reload_settings(&mut self, mut settings: LanguageSettings) {
        settings.recompute_generated_types();
        self.settings = settings;
        self.builder.reset_cycle();
    }

    /// Register the derived per-language content types with the store.
    /// Belongs to the same cycle as rule building.
    pub fn register_generated_types(&self, store: &mut dyn ContentStore) -> Result<(), StoreError> {
        linker::register_generated_types(store, &self.settings)
    }

    /// Direct access to the linker for edit propagation and serving-side
    /// lookups beyond the trait surface.
    pub fn linker(&self) -> TranslationLinker<'_> {
        TranslationLinker::new(&self.settings)
    }
}

impl LanguageRouter for DefaultLanguageRouter {
    fn resolve(&self, request: &IncomingRequest) -> RequestContext {
        LocaleResolver::new(&self.settings).resolve(request)
    }

    fn augment_rules(&mut self, rules: Vec<RewriteRule>) -> Vec<RewriteRule> {
        self.builder.build(&self.settings, rules)
    }

    fn reset_rule_cycle(&mut self) {
        self.builder.reset_cycle();
    }

    fn convert_url(&self, url: &str, target: &Language) -> String {
        UrlConverter::new(&self.settings).convert(url, target)
    }

    fn convert_content_url(
        &self,
        store: &dyn ContentStore,
        ctx: &mut RequestContext,
        url: &str,
        item_id: ContentId,
    ) -> String {
        UrlConverter::new(&self.settings).convert_content_url(store, ctx, url, item_id)
    }

    fn ensure_translations(
        &self,
        store: &mut dyn ContentStore,
        cache: &mut SlugCache,
        canonical_id: ContentId,
    ) -> Result<LinkMap> {
        self.linker().ensure_translations(store, cache, canonical_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::en_bg_settings;
    use crate::store::{ContentItem, MemoryStore};

    fn boxed_router() -> Box<dyn LanguageRouter> {
        Box::new(DefaultLanguageRouter::new(en_bg_settings()))
    }

    #[test]
    fn test_router_is_object_safe_and_resolves() {
        let router = boxed_router();
        let ctx = router.resolve(&IncomingRequest::new("/bg/about/"));
        assert_eq!(ctx.lang().code(), "bg");
    }

    #[test]
    fn test_router_full_request_flow() {
        let mut router = DefaultLanguageRouter::new(en_bg_settings());
        let mut store = MemoryStore::new();

        let rules = router.augment_rules(vec![RewriteRule::new(
            "(.?.+?)/?$",
            "post_type=page&pagename=$matches[1]",
        )]);
        assert_eq!(rules.len(), 2);

        let id = store
            .create_item(ContentItem {
                item_type: "page".to_string(),
                title: "About".to_string(),
                slug: "about".to_string(),
                status: "publish".to_string(),
                ..ContentItem::default()
            })
            .unwrap();

        let mut ctx = router.resolve(&IncomingRequest::new("/bg/about/"));
        router
            .ensure_translations(&mut store, &mut ctx.slug_cache, id)
            .unwrap();

        let url = router.convert_content_url(&store, &mut ctx, "/about/", id);
        assert_eq!(url, "/bg/about/");
    }

    #[test]
    fn test_reload_settings_restarts_cycle() {
        let mut router = DefaultLanguageRouter::new(en_bg_settings());
        let rule = RewriteRule::new("(.?.+?)/?$", "post_type=page&pagename=$matches[1]");

        let first = router.augment_rules(vec![rule.clone()]);
        assert_eq!(first.len(), 2);

        router.reload_settings(en_bg_settings());
        let second = router.augment_rules(vec![rule]);
        assert_eq!(second.len(), 2);
    }
}
