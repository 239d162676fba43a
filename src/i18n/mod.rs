//! Internationalization (i18n) module: the language catalogue and the
//! validated language handle used across the routing engine.
//!
//! - `registry`: lookup surface over the configured language catalogue
//! - `language`: type-safe handle constructible only for enabled languages

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
