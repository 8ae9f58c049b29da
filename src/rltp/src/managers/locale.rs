//! Per-language display string overrides.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::{Database, LocaleMap};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    /// language → key → text
    #[serde(deserialize_with = "lenient::map")]
    pub languages: IndexMap<String, LocaleMap>,
}

#[derive(Debug, Default)]
pub struct LocaleManager {
    config: LocaleConfig,
}

impl ContentManager for LocaleManager {
    fn name(&self) -> &'static str {
        "Locale"
    }

    fn config_name(&self) -> &'static str {
        "LocaleConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        ctx.locale.seed_languages(&mut db.locales, &self.config.languages);
        info!(languages = self.config.languages.len(), "Locale changes applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LazyTable;
    use serde_json::json;

    #[test]
    fn test_seeds_language_overrides() {
        let mut db = Database::default();
        for lang in ["en", "de"] {
            let mut map = LocaleMap::new();
            map.insert("greeting".into(), format!("{lang} hello"));
            db.locales.global.insert(lang.into(), LazyTable::new(map));
        }

        let mut ctx = Context::default();
        let mut manager = LocaleManager::default();
        manager.load_config(
            &ConfigTree::new(json!({
                "enabled": true,
                "languages": { "de": { "greeting": "hallo" }, "broken": 5 }
            })),
            &mut ctx,
        );
        manager.post_db(&mut db, &mut ctx);

        assert_eq!(db.locales.global["de"].get("greeting").map(String::as_str), Some("hallo"));
        assert_eq!(db.locales.global["en"].get("greeting").map(String::as_str), Some("en hello"));
    }
}
