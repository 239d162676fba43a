//! Language routing and translation linking for content-management sites.
//!
//! The engine serves the same logical content in several languages, each
//! language backed by its own stored duplicate linked to a canonical item:
//!
//! - [`resolver::LocaleResolver`] derives the active language from an
//!   incoming request
//! - [`rewrite::RuleBuilder`] augments the host dispatcher's rewrite rules
//!   so translated content is reachable through language-prefixed or
//!   query-parameter URLs
//! - [`linker::TranslationLinker`] keeps the per-language duplicate family
//!   complete and consistent
//! - [`convert::UrlConverter`] rewrites outgoing URLs, translating the
//!   slugs embedded in hierarchical paths
//!
//! Content storage stays external behind [`store::ContentStore`]; hosts
//! program against the [`router::LanguageRouter`] trait.

pub mod config;
pub mod convert;
pub mod i18n;
pub mod linker;
pub mod request;
pub mod resolver;
pub mod rewrite;
pub mod router;
pub mod slug_cache;
pub mod store;

pub use config::{LanguageSettings, RoutingMode};
pub use convert::UrlConverter;
pub use i18n::{Language, LanguageConfig, LanguageRegistry};
pub use linker::{register_generated_types, TranslationEdit, TranslationLinker};
pub use request::{IncomingRequest, RequestContext};
pub use resolver::LocaleResolver;
pub use rewrite::{RewriteRule, RuleBuilder};
pub use router::{DefaultLanguageRouter, LanguageRouter};
pub use slug_cache::SlugCache;
pub use store::{ContentId, ContentItem, ContentStore, MemoryStore, StoreError};
