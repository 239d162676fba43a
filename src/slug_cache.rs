//! Request-scoped slug cache.
//!
//! One URL conversion pass can look up the same ancestor slugs many times;
//! the cache keeps each store lookup to one per request. It lives inside
//! [`crate::request::RequestContext`] and is dropped with it at request
//! end, so nothing leaks between requests. Do not promote it to a
//! process-wide cache without an invalidation contract tied to store
//! writes.

use crate::store::ContentId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SlugCache {
    entries: HashMap<ContentId, String>,
}

impl SlugCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached slug for an id, if present.
    pub fn get(&self, id: ContentId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Cache a slug. The first value for an id wins; later inserts for the
    /// same id are ignored.
    pub fn insert(&mut self, id: ContentId, slug: impl Into<String>) {
        self.entries.entry(id).or_insert_with(|| slug.into());
    }

    /// Cached slug for an id, fetching and caching it on a miss.
    ///
    /// The fetch result is only cached when it is `Some`; a missing item
    /// stays uncached and will be retried on the next call.
    pub fn get_or_fetch<F>(&mut self, id: ContentId, fetch: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(slug) = self.entries.get(&id) {
            return Some(slug.clone());
        }
        let slug = fetch()?;
        self.entries.insert(id, slug.clone());
        Some(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
