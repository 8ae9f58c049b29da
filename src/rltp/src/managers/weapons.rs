//! Weapon categories and unlootable weapons.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::{Context, WeaponCatalog};
use crate::db::Database;

/// Sides a weapon cannot be looted from
pub const UNLOOTABLE_SIDES: [&str; 3] = ["Bear", "Usec", "Savage"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeaponsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub unlootable_weapons: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub lootable_weapons: Vec<String>,
    /// category → weapon id → description
    #[serde(deserialize_with = "lenient::map")]
    pub categories: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Debug, Default)]
pub struct WeaponsManager {
    config: WeaponsConfig,
}

impl ContentManager for WeaponsManager {
    fn name(&self) -> &'static str {
        "Weapons"
    }

    fn config_name(&self) -> &'static str {
        "WeaponsConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, ctx: &mut Context) {
        self.config = tree.project(self.config_name());
        ctx.weapons = WeaponCatalog::new(self.config.categories.clone());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, _ctx: &mut Context) {
        if !self.config.unlootable_weapons {
            return;
        }

        let lootable: HashSet<&str> = self
            .config
            .lootable_weapons
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let mut marked = 0;
        for (id, template) in db.templates.items.iter_mut() {
            if id.trim().is_empty() || lootable.contains(id.as_str()) {
                continue;
            }
            let props = &mut template.props;
            let positive = |v: Option<f64>| v.is_some_and(|v| v > 0.0);
            if positive(props.recoil_force_back) && positive(props.recoil_force_up) && positive(props.recoil_camera) {
                props.unlootable = Some(true);
                props.unlootable_from_slot = Some("o".to_string());
                props.unlootable_from_side = Some(UNLOOTABLE_SIDES.iter().map(|s| s.to_string()).collect());
                marked += 1;
            }
        }

        info!(marked, "Weapons changes applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ItemTemplate;
    use serde_json::json;

    const AK: &str = "5644bd2b4bdc2d3b4c8b4572";
    const GLOCK: &str = "5a7ae0c351dfba0017554310";
    const KNIFE: &str = "57e26fc7245977162a14b800";

    fn database() -> Database {
        let mut db = Database::default();
        for (id, props) in [
            (AK, json!({ "RecoilForceBack": 400, "RecoilForceUp": 120, "RecoilCamera": 0.05 })),
            (GLOCK, json!({ "RecoilForceBack": 300, "RecoilForceUp": 90, "RecoilCamera": 0.1 })),
            (KNIFE, json!({ "RecoilForceBack": 0, "RecoilForceUp": 0 })),
        ] {
            let template: ItemTemplate = serde_json::from_value(json!({ "_id": id, "_props": props })).unwrap();
            db.templates.items.insert(id.to_string(), template);
        }
        db
    }

    #[test]
    fn test_marks_weapons_unlootable() {
        let mut db = database();
        let mut ctx = Context::default();
        let mut manager = WeaponsManager::default();
        manager.load_config(
            &ConfigTree::new(json!({
                "enabled": true,
                "unlootableWeapons": true,
                "lootableWeapons": [GLOCK]
            })),
            &mut ctx,
        );
        manager.post_db(&mut db, &mut ctx);

        let ak = &db.templates.items[AK].props;
        assert_eq!(ak.unlootable, Some(true));
        assert_eq!(ak.unlootable_from_slot.as_deref(), Some("o"));
        assert_eq!(ak.unlootable_from_side.as_ref().unwrap().len(), 3);
        assert_eq!(db.templates.items[GLOCK].props.unlootable, None);
        assert_eq!(db.templates.items[KNIFE].props.unlootable, None);
    }

    #[test]
    fn test_publishes_catalog_even_when_disabled() {
        let mut ctx = Context::default();
        let mut manager = WeaponsManager::default();
        manager.load_config(
            &ConfigTree::new(json!({ "categories": { "pistols": { GLOCK: "Glock 17" } } })),
            &mut ctx,
        );
        assert!(!manager.enabled());
        assert_eq!(ctx.weapons.description(GLOCK), "Glock 17");
        assert_eq!(ctx.weapons.category_ids("pistols").len(), 1);
    }
}
