//! Translation Linker: keeps a canonical item's family of per-language
//! duplicates complete and consistent.
//!
//! The link map lives as metadata on the canonical item; every generated
//! duplicate carries a back-reference to its canonical id. A link whose
//! target no longer resolves is treated as missing and recreated on the
//! next pass, never surfaced as an error. Creation is not transactional:
//! the link map is persisted after each successful creation, so a failure
//! mid-family leaves durable partial progress for the next call to finish.

use crate::config::LanguageSettings;
use crate::i18n::LanguageRegistry;
use crate::request::RequestContext;
use crate::slug_cache::SlugCache;
use crate::store::{ContentId, ContentItem, ContentStore, ContentTypeOptions, StoreError};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Metadata key on the canonical item: JSON map of language code to
/// translated item id.
pub const LINK_MAP_META_KEY: &str = "_mlwp_langs";

/// Metadata key on each generated item: the canonical item's id.
pub const REL_ITEM_META_KEY: &str = "_mlwp_rel_item";

/// Metadata key on each generated item: its slug, readable without loading
/// the whole item.
pub const SLUG_META_KEY: &str = "_mlwp_slug";

/// Language code to translated item id.
pub type LinkMap = BTreeMap<String, ContentId>;

/// Read an item's translation link map. Absent or unparseable metadata is
/// an empty map; the linker rebuilds from there.
pub(crate) fn read_link_map(store: &dyn ContentStore, id: ContentId) -> LinkMap {
    let Some(raw) = store.get_meta(id, LINK_MAP_META_KEY) else {
        return LinkMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(err) => {
            warn!(id, error = %err, "unreadable translation link map, treating as empty");
            LinkMap::new()
        }
    }
}

pub(crate) fn write_link_map(
    store: &mut dyn ContentStore,
    id: ContentId,
    map: &LinkMap,
) -> Result<()> {
    let raw = serde_json::to_string(map).context("Failed to serialize translation link map")?;
    store
        .set_meta(id, LINK_MAP_META_KEY, &raw)
        .with_context(|| format!("Failed to store translation link map on item {}", id))?;
    Ok(())
}

/// Per-language override submitted from a translation editor.
#[derive(Debug, Clone, Default)]
pub struct TranslationEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub slug: Option<String>,
}

pub struct TranslationLinker<'a> {
    settings: &'a LanguageSettings,
}

impl<'a> TranslationLinker<'a> {
    pub fn new(settings: &'a LanguageSettings) -> Self {
        Self { settings }
    }

    /// Make sure every enabled language has a live duplicate of the
    /// canonical item, creating the missing ones.
    ///
    /// Shared fields (title, slug, status, author, ping/comment status,
    /// menu order, password) are cloned from the canonical item; body and
    /// excerpt are copied only into the default language's duplicate, the
    /// others start empty for translators to fill in. The parent is the
    /// parent's own duplicate for the same language when one exists.
    ///
    /// Idempotent: a second call with no intervening edits creates nothing
    /// and returns the same map. A store failure propagates; the links
    /// persisted so far stay valid and the next call fills the gap.
    pub fn ensure_translations(
        &self,
        store: &mut dyn ContentStore,
        cache: &mut SlugCache,
        canonical_id: ContentId,
    ) -> Result<LinkMap> {
        let registry = LanguageRegistry::new(self.settings);
        let canonical = store
            .get_item(canonical_id)
            .with_context(|| format!("canonical item {} not found", canonical_id))?;

        if !registry.is_enabled_content_type(&canonical.item_type) {
            warn!(
                id = canonical_id,
                item_type = %canonical.item_type,
                "item type does not participate in translation, nothing to create"
            );
            return Ok(read_link_map(store, canonical_id));
        }

        let mut link_map = read_link_map(store, canonical_id);
        let parent_links = if canonical.parent_id != 0 {
            read_link_map(store, canonical.parent_id)
        } else {
            LinkMap::new()
        };

        let mut to_create = Vec::new();
        for lang in registry.list_enabled() {
            match link_map.get(&lang.code) {
                Some(&linked) if store.get_item(linked).is_some() => {}
                Some(&linked) => {
                    debug!(
                        lang = %lang.code,
                        linked,
                        "translation link no longer resolves, recreating"
                    );
                    to_create.push(lang);
                }
                None => to_create.push(lang),
            }
        }

        for lang in to_create {
            let code = lang.code.as_str();
            let is_default = registry.default_code() == Some(code);
            let fields = ContentItem {
                id: 0,
                item_type: self.settings.generated_type_name(&canonical.item_type, code),
                parent_id: parent_links.get(code).copied().unwrap_or(0),
                title: canonical.title.clone(),
                slug: canonical.slug.clone(),
                body: if is_default {
                    canonical.body.clone()
                } else {
                    String::new()
                },
                excerpt: if is_default {
                    canonical.excerpt.clone()
                } else {
                    String::new()
                },
                status: canonical.status.clone(),
                author: canonical.author,
                ping_status: canonical.ping_status.clone(),
                comment_status: canonical.comment_status.clone(),
                menu_order: canonical.menu_order,
                password: canonical.password.clone(),
            };

            let new_id = store.create_item(fields).with_context(|| {
                format!(
                    "failed to create {} translation of item {}",
                    code, canonical_id
                )
            })?;
            store
                .set_meta(new_id, REL_ITEM_META_KEY, &canonical_id.to_string())
                .context("failed to record translation back-reference")?;
            store
                .set_meta(new_id, SLUG_META_KEY, &canonical.slug)
                .context("failed to record translation slug")?;

            link_map.insert(code.to_string(), new_id);
            // Persist after every creation, not once at the end; a failure
            // later in the loop must not orphan the items already made.
            write_link_map(store, canonical_id, &link_map)?;
            cache.insert(new_id, canonical.slug.clone());
        }

        cache.insert(canonical_id, canonical.slug.clone());
        Ok(link_map)
    }

    /// Merge submitted per-language overrides into the linked duplicates.
    ///
    /// Invoked directly by the editing surface after a save; languages
    /// without a submitted edit are left alone. The duplicate's parent is
    /// realigned with the parent's link for the same language on every
    /// edit.
    pub fn propagate_edits(
        &self,
        store: &mut dyn ContentStore,
        canonical_id: ContentId,
        edits: &BTreeMap<String, TranslationEdit>,
    ) -> Result<()> {
        let registry = LanguageRegistry::new(self.settings);
        let canonical = store
            .get_item(canonical_id)
            .with_context(|| format!("canonical item {} not found", canonical_id))?;
        let link_map = read_link_map(store, canonical_id);
        let parent_links = if canonical.parent_id != 0 {
            read_link_map(store, canonical.parent_id)
        } else {
            LinkMap::new()
        };

        for lang in registry.list_enabled() {
            let code = lang.code.as_str();
            let Some(&linked) = link_map.get(code) else {
                continue;
            };
            let Some(edit) = edits.get(code) else {
                continue;
            };
            let Some(mut item) = store.get_item(linked) else {
                debug!(lang = %code, linked, "translation link no longer resolves, skipping edit");
                continue;
            };

            if let Some(title) = &edit.title {
                item.title = title.clone();
            }
            if let Some(body) = &edit.body {
                item.body = body.clone();
            }
            if let Some(slug) = &edit.slug {
                item.slug = slug.clone();
            }
            if let Some(&parent) = parent_links.get(code) {
                item.parent_id = parent;
            }

            store
                .set_meta(linked, SLUG_META_KEY, &item.slug)
                .context("failed to update translation slug")?;
            store
                .update_item(&item)
                .with_context(|| format!("failed to save {} translation {}", code, linked))?;
        }
        Ok(())
    }

    /// Flow a programmatic update of the canonical item into its family.
    ///
    /// Housekeeping fields (status, author, ping/comment status, menu
    /// order, password) reach every duplicate; title, slug, body and
    /// excerpt reach only the default language's duplicate, the other
    /// languages keep their translated text.
    pub fn sync_default_language_edits(
        &self,
        store: &mut dyn ContentStore,
        canonical_id: ContentId,
        updated: &ContentItem,
    ) -> Result<()> {
        let registry = LanguageRegistry::new(self.settings);
        let link_map = read_link_map(store, canonical_id);

        for (code, &linked) in &link_map {
            let Some(mut item) = store.get_item(linked) else {
                debug!(lang = %code, linked, "translation link no longer resolves, skipping sync");
                continue;
            };

            item.status = updated.status.clone();
            item.author = updated.author;
            item.ping_status = updated.ping_status.clone();
            item.comment_status = updated.comment_status.clone();
            item.menu_order = updated.menu_order;
            item.password = updated.password.clone();

            if registry.default_code() == Some(code.as_str()) {
                item.title = updated.title.clone();
                item.slug = updated.slug.clone();
                item.body = updated.body.clone();
                item.excerpt = updated.excerpt.clone();
                store
                    .set_meta(linked, SLUG_META_KEY, &item.slug)
                    .context("failed to update translation slug")?;
            }

            store
                .update_item(&item)
                .with_context(|| format!("failed to sync {} translation {}", code, linked))?;
        }
        Ok(())
    }

    /// The serving-side view of an item in the request's active language.
    ///
    /// Follows a generated item's back-reference to its canonical item,
    /// then overlays the active language's title, slug, body and excerpt
    /// when that translation exists; otherwise the canonical text is
    /// served untouched.
    pub fn localized_view(
        &self,
        store: &dyn ContentStore,
        ctx: &mut RequestContext,
        item: &ContentItem,
    ) -> ContentItem {
        let registry = LanguageRegistry::new(self.settings);
        if !registry.is_enabled_content_type(&item.item_type)
            && !registry.is_generated_content_type(&item.item_type)
        {
            return item.clone();
        }

        let canonical_id = if registry.is_generated_content_type(&item.item_type) {
            store
                .get_meta(item.id, REL_ITEM_META_KEY)
                .and_then(|raw| raw.parse::<ContentId>().ok())
                .unwrap_or(item.id)
        } else {
            item.id
        };

        let mut view = if canonical_id != item.id {
            store.get_item(canonical_id).unwrap_or_else(|| item.clone())
        } else {
            item.clone()
        };

        let link_map = read_link_map(store, view.id);
        if let Some(&linked) = link_map.get(ctx.lang().code()) {
            match store.get_item(linked) {
                Some(translation) => {
                    ctx.slug_cache.insert(linked, translation.slug.clone());
                    view.title = translation.title;
                    view.slug = translation.slug;
                    view.body = translation.body;
                    view.excerpt = translation.excerpt;
                }
                None => {
                    debug!(linked, "translation link no longer resolves, serving canonical text");
                }
            }
        }
        view
    }
}

/// Register every derived per-language type with the Content Store,
/// mirroring the source type's hierarchy when the store reports it.
/// Runs once per rule-generation cycle, alongside rule building.
pub fn register_generated_types(
    store: &mut dyn ContentStore,
    settings: &LanguageSettings,
) -> Result<(), StoreError> {
    let registry = LanguageRegistry::new(settings);
    for type_name in &settings.enabled_content_types {
        let source = store.content_type_options(type_name);
        for lang in registry.list_enabled() {
            let name = settings.generated_type_name(type_name, &lang.code);
            let source_label = source
                .as_ref()
                .map(|options| options.label.clone())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| type_name.clone());
            store.register_content_type(
                &name,
                ContentTypeOptions {
                    label: format!("{} - {}", source_label, lang.label),
                    public: true,
                    hierarchical: source
                        .as_ref()
                        .map(|options| options.hierarchical)
                        .unwrap_or(false),
                    exclude_from_search: true,
                },
            )?;
        }
    }
    Ok(())
}
