//! Publishes every configured preset into the catalog.

use tracing::info;

use super::ContentManager;
use crate::config::ConfigTree;
use crate::context::Context;
use crate::db::Database;
use crate::presets::{PresetResolver, PresetsConfig};

#[derive(Debug, Default)]
pub struct PresetsManager {
    config: PresetsConfig,
}

impl ContentManager for PresetsManager {
    fn name(&self) -> &'static str {
        "Presets"
    }

    fn config_name(&self) -> &'static str {
        "PresetsConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, ctx: &mut Context) {
        self.config = tree.project(self.config_name());
        ctx.presets = PresetResolver::new(self.config.clone());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let Context { presets, locale, rng, debug, .. } = ctx;

        let mut added = 0;
        for preset_id in presets.all_preset_ids() {
            if presets.set_preset(&preset_id, db, locale, &mut *rng) {
                added += 1;
            }
        }

        if debug.print_preset_count {
            info!("Added {added} presets.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AK: &str = "5644bd2b4bdc2d3b4c8b4572";
    const MAG: &str = "55d480c04bdc2d1d4e8b456a";

    #[test]
    fn test_publishes_presets() {
        let mut db = Database::default();
        let mut ctx = Context::new(Default::default(), Some(1));
        let mut manager = PresetsManager::default();
        manager.load_config(
            &ConfigTree::new(json!({
                "enabled": true,
                "items": {
                    "ak_basic": [
                        { "_id": "r", "_tpl": AK },
                        { "_id": "m", "_tpl": MAG, "parentId": "r", "slotId": "mod_magazine" }
                    ]
                },
                "categorizedItems": { "rifles": { "ak_std": [{ "_id": "r", "_tpl": AK }] } },
                "broken": []
            })),
            &mut ctx,
        );
        manager.post_db(&mut db, &mut ctx);

        assert_eq!(db.globals.item_presets.len(), 2);
        let key = ctx.presets.preset_key("ak_basic", Some(AK));
        let preset = &db.globals.item_presets[&key];
        assert_eq!(preset.name, "AK BASIC");
        assert_eq!(preset.items.len(), 2);
        assert_eq!(preset.encyclopedia.as_deref(), Some(AK));
    }

    #[test]
    fn test_resolver_published_while_disabled() {
        let mut ctx = Context::default();
        let mut manager = PresetsManager::default();
        manager.load_config(&ConfigTree::new(json!({ "items": { "p": [{ "_id": "r", "_tpl": AK }] } })), &mut ctx);
        assert!(!manager.enabled());
        assert_eq!(ctx.presets.all_preset_ids(), vec!["p".to_string()]);
    }
}
