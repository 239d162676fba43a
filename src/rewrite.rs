//! Route Rule Builder: language-aware rewrite rules for the host dispatcher.
//!
//! The host hands over its ordered list of `(pattern, query template)`
//! rules once per rule-generation cycle. For every rule that targets a
//! translated content type, the builder emits one additional rule per
//! enabled language, rewriting the query template to the per-language
//! generated type and, in prefix-path mode, inserting a language capture
//! group in front of the pattern. Generated rules are prepended so they
//! win over the originals on first match.

use crate::config::{LanguageSettings, RoutingMode};
use crate::i18n::LanguageRegistry;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Query argument carrying the active language.
pub const LANG_QUERY_VAR: &str = "mlwp_lang";

/// One dispatcher rewrite rule: a URL-matching regex pattern and the query
/// template it expands to.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRule {
    pub pattern: String,
    pub query: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            query: query.into(),
        }
    }
}

/// A parsed query template: literal text interleaved with `$matches[N]`
/// backreferences. Renumbering is a transform over this token list, never
/// regex surgery on the raw string.
#[derive(Debug, Clone, PartialEq)]
enum QueryToken {
    Literal(String),
    Backref(usize),
}

static BACKREF_REGEX: OnceLock<Regex> = OnceLock::new();

fn backref_regex() -> &'static Regex {
    BACKREF_REGEX.get_or_init(|| Regex::new(r"\$matches\[(\d+)\]").expect("valid regex"))
}

fn parse_query_template(query: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in backref_regex().captures_iter(query) {
        let whole = caps.get(0).expect("match group 0 always present");
        if whole.start() > last {
            tokens.push(QueryToken::Literal(query[last..whole.start()].to_string()));
        }
        match caps[1].parse::<usize>() {
            Ok(index) => tokens.push(QueryToken::Backref(index)),
            // An index too large for usize is left as literal text.
            Err(_) => tokens.push(QueryToken::Literal(whole.as_str().to_string())),
        }
        last = whole.end();
    }
    if last < query.len() {
        tokens.push(QueryToken::Literal(query[last..].to_string()));
    }
    tokens
}

fn render_query_template(tokens: &[QueryToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            QueryToken::Literal(text) => out.push_str(text),
            QueryToken::Backref(index) => out.push_str(&format!("$matches[{}]", index)),
        }
    }
    out
}

fn shift_backrefs(tokens: &mut [QueryToken], by: usize) {
    for token in tokens.iter_mut() {
        if let QueryToken::Backref(index) = token {
            *index += by;
        }
    }
}

/// Builds the augmented rule list, at most once per rule-generation cycle.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    built_this_cycle: bool,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arm the builder for the next rule-generation cycle.
    pub fn reset_cycle(&mut self) {
        self.built_this_cycle = false;
    }

    /// Augment the host's rule list with per-language rules.
    ///
    /// Called again within the same cycle it returns its input unchanged,
    /// so rules are never duplicated. With no default language configured
    /// the list also passes through untouched.
    pub fn build(
        &mut self,
        settings: &LanguageSettings,
        rules: Vec<RewriteRule>,
    ) -> Vec<RewriteRule> {
        if self.built_this_cycle {
            debug!("rewrite rules already built this cycle, leaving list untouched");
            return rules;
        }
        self.built_this_cycle = true;

        let registry = LanguageRegistry::new(settings);
        let Some(default_lang) = registry.default_code() else {
            warn!("no default language configured, skipping rewrite rule generation");
            return rules;
        };

        if settings.routing_mode == RoutingMode::Subdomain {
            warn!("subdomain routing is not implemented, skipping rewrite rule generation");
            return rules;
        }

        let mut generated = Vec::new();
        for rule in &rules {
            if !should_build(settings, &rule.query) {
                continue;
            }
            for lang in registry.list_enabled() {
                // No rules for the default language unless it appears in URLs.
                if lang.code == default_lang && !settings.default_lang_in_url {
                    continue;
                }
                generated.push(localize_rule(settings, rule, &lang.code));
            }
        }

        debug!(
            generated = generated.len(),
            original = rules.len(),
            "rewrite rule generation finished"
        );

        generated.extend(rules);
        generated
    }
}

/// A rule qualifies when its query template references an enabled content
/// type, or a page-name lookup while pages are translated. Anything else
/// is left untouched and not duplicated.
fn should_build(settings: &LanguageSettings, query: &str) -> bool {
    for type_name in &settings.enabled_content_types {
        if query.contains(&format!("{}=", type_name))
            || query.contains(&format!("post_type={}&", type_name))
        {
            return true;
        }
    }
    settings.enabled_content_types.contains("page") && query.contains("pagename=")
}

fn localize_rule(settings: &LanguageSettings, rule: &RewriteRule, lang: &str) -> RewriteRule {
    let mut query = localize_query_types(settings, &rule.query, lang);

    let pattern = match settings.routing_mode {
        RoutingMode::PrefixPath => {
            // The language segment becomes a new leading capture group, so
            // every numbered backreference moves up by one.
            let mut tokens = parse_query_template(&query);
            shift_backrefs(&mut tokens, 1);
            query = render_query_template(&tokens);
            format!("({})/{}", lang, rule.pattern)
        }
        RoutingMode::QueryParam => rule.pattern.clone(),
        // Unreachable from build(), kept total for direct callers.
        RoutingMode::Subdomain => rule.pattern.clone(),
    };

    query.push_str(&format!("&{}={}", LANG_QUERY_VAR, lang));

    RewriteRule { pattern, query }
}

/// Replace generic content-type keys with the per-language generated type,
/// so each language's items can carry independent slugs.
fn localize_query_types(settings: &LanguageSettings, query: &str, lang: &str) -> String {
    let mut query = query.to_string();
    for type_name in &settings.enabled_content_types {
        let generated = settings.generated_type_name(type_name, lang);
        if type_name == "page" {
            // Page lookups go by name against the generated page type.
            query = query.replace(
                &format!("post_type={}&pagename=", type_name),
                &format!("post_type={}&name=", generated),
            );
            query = query.replace("pagename=", &format!("post_type={}&name=", generated));
            continue;
        }
        query = query.replace(
            &format!("post_type={}&", type_name),
            &format!("post_type={}&", generated),
        );
        query = query.replace(&format!("{}=", type_name), &format!("{}=", generated));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::en_bg_settings;

    fn page_rule() -> RewriteRule {
        RewriteRule::new("(.?.+?)(?:/([0-9]+))?/?$", "post_type=page&pagename=$matches[1]")
    }

    // ==================== Query Template Tests ====================

    #[test]
    fn test_parse_and_render_roundtrip() {
        let query = "post_type=page&pagename=$matches[1]&paged=$matches[2]";
        let tokens = parse_query_template(query);
        assert_eq!(render_query_template(&tokens), query);
    }

    #[test]
    fn test_shift_backrefs() {
        let mut tokens = parse_query_template("pagename=$matches[1]&paged=$matches[2]");
        shift_backrefs(&mut tokens, 1);
        assert_eq!(
            render_query_template(&tokens),
            "pagename=$matches[2]&paged=$matches[3]"
        );
    }

    #[test]
    fn test_parse_without_backrefs() {
        let tokens = parse_query_template("post_type=page");
        assert_eq!(tokens, vec![QueryToken::Literal("post_type=page".to_string())]);
    }

    // ==================== Eligibility Tests ====================

    #[test]
    fn test_should_build_page_rule() {
        let settings = en_bg_settings();
        assert!(should_build(&settings, "post_type=page&pagename=$matches[1]"));
        assert!(should_build(&settings, "pagename=$matches[1]"));
    }

    #[test]
    fn test_should_build_generic_type_rule() {
        let settings = en_bg_settings();
        assert!(should_build(&settings, "post_type=post&name=$matches[1]"));
        assert!(should_build(&settings, "post=$matches[1]"));
    }

    #[test]
    fn test_should_not_build_unrelated_rule() {
        let settings = en_bg_settings();
        assert!(!should_build(&settings, "category_name=$matches[1]"));
        assert!(!should_build(&settings, "attachment=$matches[1]"));
    }

    // ==================== Build Tests ====================

    #[test]
    fn test_build_prefix_path_page_rule() {
        let mut settings = en_bg_settings();
        settings.default_lang_in_url = false;
        let mut builder = RuleBuilder::new();

        let rules = builder.build(&settings, vec![page_rule()]);

        // One generated rule for bg, none for the default en, plus the
        // original at the end.
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "(bg)/(.?.+?)(?:/([0-9]+))?/?$");
        assert_eq!(
            rules[0].query,
            "post_type=generated_page_bg&name=$matches[2]&mlwp_lang=bg"
        );
        assert_eq!(rules[1], page_rule());
    }

    #[test]
    fn test_build_includes_default_when_configured() {
        let mut settings = en_bg_settings();
        settings.default_lang_in_url = true;
        let mut builder = RuleBuilder::new();

        let rules = builder.build(&settings, vec![page_rule()]);

        assert_eq!(rules.len(), 3);
        // Languages come out in display order: en first, then bg.
        assert!(rules[0].pattern.starts_with("(en)/"));
        assert!(rules[1].pattern.starts_with("(bg)/"));
    }

    #[test]
    fn test_build_query_param_mode() {
        let mut settings = en_bg_settings();
        settings.routing_mode = RoutingMode::QueryParam;
        let mut builder = RuleBuilder::new();

        let rules = builder.build(&settings, vec![page_rule()]);

        assert_eq!(rules.len(), 2);
        // Pattern untouched, so no backref renumbering either.
        assert_eq!(rules[0].pattern, page_rule().pattern);
        assert_eq!(
            rules[0].query,
            "post_type=generated_page_bg&name=$matches[1]&mlwp_lang=bg"
        );
    }

    #[test]
    fn test_build_subdomain_mode_is_noop() {
        let mut settings = en_bg_settings();
        settings.routing_mode = RoutingMode::Subdomain;
        let mut builder = RuleBuilder::new();

        let rules = builder.build(&settings, vec![page_rule()]);
        assert_eq!(rules, vec![page_rule()]);
    }

    #[test]
    fn test_build_without_default_language_is_noop() {
        let mut settings = en_bg_settings();
        settings.default_lang = None;
        settings.enabled_langs.clear();
        let mut builder = RuleBuilder::new();

        let rules = builder.build(&settings, vec![page_rule()]);
        assert_eq!(rules, vec![page_rule()]);
    }

    #[test]
    fn test_build_twice_same_cycle_does_not_duplicate() {
        let settings = en_bg_settings();
        let mut builder = RuleBuilder::new();

        let first = builder.build(&settings, vec![page_rule()]);
        let first_len = first.len();
        let second = builder.build(&settings, first);

        assert_eq!(second.len(), first_len);
    }

    #[test]
    fn test_reset_cycle_allows_rebuild() {
        let settings = en_bg_settings();
        let mut builder = RuleBuilder::new();

        let first = builder.build(&settings, vec![page_rule()]);
        builder.reset_cycle();
        // A new cycle starts from the host's fresh original rules.
        let rebuilt = builder.build(&settings, vec![page_rule()]);

        assert_eq!(rebuilt.len(), first.len());
    }

    #[test]
    fn test_unrelated_rules_pass_through_in_order() {
        let settings = en_bg_settings();
        let mut builder = RuleBuilder::new();
        let unrelated = RewriteRule::new("feed/?$", "feed=rss2");

        let rules = builder.build(&settings, vec![unrelated.clone(), page_rule()]);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1], unrelated);
        assert_eq!(rules[2], page_rule());
    }

    #[test]
    fn test_generic_post_type_rewrite() {
        let settings = en_bg_settings();
        let mut builder = RuleBuilder::new();
        let rule = RewriteRule::new("([^/]+)/?$", "post_type=post&name=$matches[1]");

        let rules = builder.build(&settings, vec![rule]);

        assert_eq!(
            rules[0].query,
            "post_type=generated_post_bg&name=$matches[2]&mlwp_lang=bg"
        );
    }
}
