//! Global game knobs.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::Database;
use crate::ids;

/// Status effects whose treatment price is zeroed
pub const REMOVE_PRICE_EFFECTS: [&str; 5] = [
    "BreakPart",
    "Fracture",
    "LightBleeding",
    "HeavyBleeding",
    "Intoxication",
];

pub const FLEA_MIN_LEVEL: i64 = 70;
pub const SCAV_COOLDOWN: i64 = 2_147_483_646;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_status_effect_remove_prices: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_post_raid_heal: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_flea: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_flea_blacklist: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_trader_money_requirements: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub delay_scav_run: bool,
}

#[derive(Debug, Default)]
pub struct GlobalsManager {
    config: GlobalsConfig,
}

impl ContentManager for GlobalsManager {
    fn name(&self) -> &'static str {
        "Globals"
    }

    fn config_name(&self) -> &'static str {
        "GlobalsConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        if ctx.debug.print_new_hashes {
            for _ in 0..100 {
                println!("{}", ids::generate(&mut ctx.rng));
            }
        }

        let config = &mut db.globals.config;
        if self.config.remove_status_effect_remove_prices {
            for effect in REMOVE_PRICE_EFFECTS {
                set_existing(config, &format!("/Health/Effects/{effect}"), "RemovePrice", json!(0));
            }
        }

        if self.config.remove_post_raid_heal {
            for trader in db.traders.values_mut() {
                trader.base.medic = Some(false);
            }
        }

        if self.config.disable_flea {
            set_existing(config, "/RagFair", "enabled", json!(true));
            set_existing(config, "/RagFair", "minUserLevel", json!(FLEA_MIN_LEVEL));
        }

        if self.config.disable_flea_blacklist {
            for template in db.templates.items.values_mut() {
                template.props.can_sell_on_ragfair = Some(true);
                template.props.can_require_on_ragfair = Some(true);
            }
        }

        if self.config.remove_trader_money_requirements {
            for trader in db.traders.values_mut() {
                for level in &mut trader.base.loyalty_levels {
                    level.min_sales_sum = Some(0.0);
                }
            }
        }

        if self.config.delay_scav_run {
            set_existing(config, "", "SavagePlayCooldown", json!(SCAV_COOLDOWN));
        }

        info!("Globals changes applied");
    }
}

/// Set `key` on the object at `pointer`, if that object exists
fn set_existing(root: &mut Value, pointer: &str, key: &str, value: Value) {
    match root.pointer_mut(pointer) {
        Some(Value::Object(map)) => {
            map.insert(key.to_string(), value);
        }
        _ => debug!(path = pointer, key, "globals section missing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Trader;

    fn database() -> Database {
        let mut db = Database::default();
        db.globals.config = json!({
            "Health": { "Effects": { "Fracture": { "RemovePrice": 400 }, "Intoxication": { "RemovePrice": 90 } } },
            "RagFair": { "enabled": false, "minUserLevel": 15 },
            "SavagePlayCooldown": 600
        });
        let trader: Trader = serde_json::from_value(json!({
            "base": { "_id": "54cb50c76803fa8b248b4571", "medic": true, "loyaltyLevels": [{ "minSalesSum": 100 }] }
        }))
        .unwrap();
        db.traders.insert(trader.id().to_string(), trader);
        db
    }

    fn manager(config: Value) -> GlobalsManager {
        let mut manager = GlobalsManager::default();
        manager.load_config(&ConfigTree::new(config), &mut Context::default());
        manager
    }

    #[test]
    fn test_each_knob_is_flagged() {
        let mut db = database();
        let mut m = manager(json!({ "enabled": true, "disableFlea": true }));
        m.post_db(&mut db, &mut Context::default());

        assert_eq!(db.globals.config["RagFair"]["minUserLevel"], json!(70));
        assert_eq!(db.globals.config["SavagePlayCooldown"], json!(600));
        assert_eq!(db.traders.values().next().unwrap().base.medic, Some(true));
    }

    #[test]
    fn test_all_knobs() {
        let mut db = database();
        let mut m = manager(json!({
            "enabled": true,
            "removeStatusEffectRemovePrices": true,
            "removePostRaidHeal": true,
            "removeTraderMoneyRequirements": true,
            "delayScavRun": true
        }));
        m.post_db(&mut db, &mut Context::default());

        let effects = &db.globals.config["Health"]["Effects"];
        assert_eq!(effects["Fracture"]["RemovePrice"], json!(0));
        assert_eq!(effects["Intoxication"]["RemovePrice"], json!(0));
        assert!(effects.get("BreakPart").is_none());
        assert_eq!(db.globals.config["SavagePlayCooldown"], json!(SCAV_COOLDOWN));

        let trader = db.traders.values().next().unwrap();
        assert_eq!(trader.base.medic, Some(false));
        assert_eq!(trader.base.loyalty_levels[0].min_sales_sum, Some(0.0));
    }

    #[test]
    fn test_string_true_is_not_enabled() {
        let m = manager(json!({ "enabled": "true" }));
        assert!(!m.enabled());
    }
}
