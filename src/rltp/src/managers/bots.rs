//! Bot loot weights.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::Database;
use crate::ids;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LootMultiplier {
    #[serde(rename = "templateId", deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    #[serde(rename = "lootMultipliers", deserialize_with = "lenient::vec")]
    pub loot_multipliers: Vec<LootMultiplier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::map")]
    pub bots: IndexMap<String, BotConfig>,
}

#[derive(Debug, Default)]
pub struct BotsManager {
    config: BotsConfig,
}

impl ContentManager for BotsManager {
    fn name(&self) -> &'static str {
        "Bots"
    }

    fn config_name(&self) -> &'static str {
        "BotsConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, _ctx: &mut Context) {
        for (bot_key, bot_config) in &self.config.bots {
            let Some(bot) = db.bots.get_mut(bot_key) else {
                warn!(bot = %bot_key, "unknown bot type");
                continue;
            };

            for lm in &bot_config.loot_multipliers {
                let Some(multiplier) = lm.multiplier else {
                    continue;
                };
                if !ids::is_valid(&lm.template_id) {
                    continue;
                }
                for pool in bot.inventory.items.pools_mut() {
                    if let Some(weight) = pool.get_mut(&lm.template_id) {
                        *weight = scaled_weight(*weight, multiplier);
                    }
                }
            }
        }

        info!("Bots changes applied");
    }
}

/// Floor of the scaled weight, never below 1
pub fn scaled_weight(weight: i64, multiplier: f64) -> i64 {
    ((weight as f64 * multiplier).floor() as i64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::BotType;
    use serde_json::json;

    const SALEWA: &str = "544fb45d4bdc2dee738b4568";

    #[test]
    fn test_scaled_weight() {
        assert_eq!(scaled_weight(10, 2.5), 25);
        assert_eq!(scaled_weight(3, 0.5), 1);
        assert_eq!(scaled_weight(10, 0.0), 1);
        assert_eq!(scaled_weight(7, 1.0), 7);
    }

    #[test]
    fn test_multiplies_every_pool() {
        let mut db = Database::default();
        let bot: BotType = serde_json::from_value(json!({
            "inventory": { "items": {
                "Backpack": { SALEWA: 10, "other": 4 },
                "Pockets": { SALEWA: 3 },
                "TacticalVest": {}
            } }
        }))
        .unwrap();
        db.bots.insert("assault".to_string(), bot);

        let mut manager = BotsManager::default();
        manager.load_config(
            &ConfigTree::new(json!({
                "enabled": true,
                "bots": {
                    "assault": { "lootMultipliers": [{ "templateId": SALEWA, "multiplier": 0.25 }] },
                    "bossKilla": { "lootMultipliers": [] }
                }
            })),
            &mut Context::default(),
        );
        manager.post_db(&mut db, &mut Context::default());

        let pools = &db.bots["assault"].inventory.items;
        assert_eq!(pools.backpack[SALEWA], 2);
        assert_eq!(pools.backpack["other"], 4);
        assert_eq!(pools.pockets[SALEWA], 1);
        assert!(!pools.tactical_vest.contains_key(SALEWA));
    }
}
