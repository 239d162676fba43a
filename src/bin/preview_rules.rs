//! Print the augmented rewrite rule set for a settings document.
//!
//! Usage: `preview-rules [settings.json]`. Without an argument the path
//! comes from `MLWP_SETTINGS`, falling back to a built-in demo
//! configuration. Handy for checking what a configuration change does to
//! the dispatcher before saving it.

use anyhow::Result;
use multilingual_router::{
    DefaultLanguageRouter, LanguageRouter, LanguageSettings, RewriteRule, RoutingMode,
};
use tracing::info;

fn demo_settings() -> LanguageSettings {
    let mut settings = LanguageSettings {
        default_lang: Some("en".to_string()),
        enabled_langs: ["en", "bg"].iter().map(|s| s.to_string()).collect(),
        routing_mode: RoutingMode::PrefixPath,
        home_url: "http://example.com/".to_string(),
        ..LanguageSettings::default()
    };
    settings.recompute_generated_types();
    settings
}

fn demo_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::new("(.?.+?)(?:/([0-9]+))?/?$", "post_type=page&pagename=$matches[1]&paged=$matches[2]"),
        RewriteRule::new("([^/]+)/?$", "post_type=post&name=$matches[1]"),
        RewriteRule::new("feed/?$", "feed=rss2"),
    ]
}

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("multilingual_router=info".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MLWP_SETTINGS").ok());

    let settings = match path {
        Some(path) => {
            info!("Loading settings from {}", path);
            LanguageSettings::from_json_file(&path)?
        }
        None => {
            info!("No settings file given, using the built-in demo configuration");
            demo_settings()
        }
    };

    let mut router = DefaultLanguageRouter::new(settings);
    let rules = router.augment_rules(demo_rules());

    println!("{:<45} {}", "PATTERN", "QUERY");
    for rule in &rules {
        println!("{:<45} {}", rule.pattern, rule.query);
    }
    Ok(())
}
