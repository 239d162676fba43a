//! Content Store collaborator interface.
//!
//! The engine never owns content storage; it consumes this trait. A small
//! in-memory implementation is provided for tests, demos and as a reference
//! for host integrations.

use std::collections::BTreeMap;
use thiserror::Error;

/// Identifier of a content item. Zero is reserved for "no parent".
pub type ContentId = u64;

/// The subset of a content record the engine reads and writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentItem {
    pub id: ContentId,
    pub item_type: String,
    /// 0 = no parent
    pub parent_id: ContentId,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: String,
    pub status: String,
    pub author: u64,
    pub ping_status: String,
    pub comment_status: String,
    pub menu_order: i32,
    pub password: String,
}

/// Registration options for a content type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTypeOptions {
    pub label: String,
    pub public: bool,
    pub hierarchical: bool,
    pub exclude_from_search: bool,
}

/// Errors a Content Store implementation may surface.
///
/// This is the only hard failure the engine propagates upward; everything
/// else degrades to default-language behavior.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content item {0} not found")]
    NotFound(ContentId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Synchronous content storage collaborator.
///
/// `list_ancestors` returns the chain nearest-parent-first (parent,
/// grandparent, ...), matching the usual host convention; callers that
/// need oldest-first iterate it in reverse.
pub trait ContentStore {
    fn get_item(&self, id: ContentId) -> Option<ContentItem>;

    /// Persist a new item; the `id` field of `fields` is ignored.
    fn create_item(&mut self, fields: ContentItem) -> Result<ContentId, StoreError>;

    /// Update an existing item in place. Returns `false` when the item
    /// does not exist.
    fn update_item(&mut self, fields: &ContentItem) -> Result<bool, StoreError>;

    fn get_meta(&self, id: ContentId, key: &str) -> Option<String>;

    fn set_meta(&mut self, id: ContentId, key: &str, value: &str) -> Result<(), StoreError>;

    fn list_ancestors(&self, id: ContentId) -> Vec<ContentId>;

    fn register_content_type(
        &mut self,
        name: &str,
        options: ContentTypeOptions,
    ) -> Result<(), StoreError>;

    /// Options a content type was registered with, when the store tracks
    /// them. Used to mirror hierarchy onto generated types; `None` is a
    /// valid answer.
    fn content_type_options(&self, _name: &str) -> Option<ContentTypeOptions> {
        None
    }
}

/// In-memory Content Store.
///
/// Backs the test suite and the diagnostic binary; host applications bring
/// their own implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: ContentId,
    items: BTreeMap<ContentId, ContentItem>,
    meta: BTreeMap<(ContentId, String), String>,
    types: BTreeMap<String, ContentTypeOptions>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items; handy for idempotence assertions.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Names of all registered content types.
    pub fn registered_types(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

impl ContentStore for MemoryStore {
    fn get_item(&self, id: ContentId) -> Option<ContentItem> {
        self.items.get(&id).cloned()
    }

    fn create_item(&mut self, mut fields: ContentItem) -> Result<ContentId, StoreError> {
        self.next_id += 1;
        fields.id = self.next_id;
        self.items.insert(fields.id, fields);
        Ok(self.next_id)
    }

    fn update_item(&mut self, fields: &ContentItem) -> Result<bool, StoreError> {
        match self.items.get_mut(&fields.id) {
            Some(existing) => {
                *existing = fields.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_meta(&self, id: ContentId, key: &str) -> Option<String> {
        self.meta.get(&(id, key.to_string())).cloned()
    }

    fn set_meta(&mut self, id: ContentId, key: &str, value: &str) -> Result<(), StoreError> {
        if !self.items.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.meta.insert((id, key.to_string()), value.to_string());
        Ok(())
    }

    fn list_ancestors(&self, id: ContentId) -> Vec<ContentId> {
        let mut ancestors = Vec::new();
        let mut current = self.items.get(&id).map(|item| item.parent_id).unwrap_or(0);
        while current != 0 {
            // Cycles would loop forever; a parent chain revisiting an id is
            // corrupt data, stop there.
            if ancestors.contains(&current) {
                break;
            }
            ancestors.push(current);
            current = self
                .items
                .get(&current)
                .map(|item| item.parent_id)
                .unwrap_or(0);
        }
        ancestors
    }

    fn register_content_type(
        &mut self,
        name: &str,
        options: ContentTypeOptions,
    ) -> Result<(), StoreError> {
        self.types.insert(name.to_string(), options);
        Ok(())
    }

    fn content_type_options(&self, name: &str) -> Option<ContentTypeOptions> {
        self.types.get(name).cloned()
    }
}
