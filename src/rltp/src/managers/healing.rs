//! Full heal after death.

use serde::Deserialize;
use serde_json::Map;
use tracing::info;

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::PmcProfile;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealingConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
}

#[derive(Debug, Default)]
pub struct HealingManager {
    config: HealingConfig,
}

impl HealingManager {
    /// Restore every body part and clear its effects. No-op when disabled.
    pub fn on_player_died(&self, profile: &mut PmcProfile) {
        if !self.enabled() {
            return;
        }
        let Some(health) = profile.health.as_mut() else {
            return;
        };
        for part in health.body_parts.values_mut() {
            part.health.current = part.health.maximum;
            part.effects = Some(Map::new());
        }
        info!("Player healed");
    }
}

impl ContentManager for HealingManager {
    fn name(&self) -> &'static str {
        "Healing"
    }

    fn config_name(&self) -> &'static str {
        "HealingConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wounded() -> PmcProfile {
        serde_json::from_value(json!({
            "Health": { "BodyParts": {
                "Head": { "Health": { "Current": 10, "Maximum": 35 }, "Effects": { "Fracture": { "Time": -1 } } },
                "Chest": { "Health": { "Current": 0, "Maximum": 85 } }
            } }
        }))
        .unwrap()
    }

    #[test]
    fn test_heals_when_enabled() {
        let mut manager = HealingManager::default();
        manager.load_config(&ConfigTree::new(json!({ "enabled": true })), &mut Context::default());
        let mut profile = wounded();
        manager.on_player_died(&mut profile);

        let parts = &profile.health.as_ref().unwrap().body_parts;
        assert_eq!(parts["Head"].health.current, 35.0);
        assert_eq!(parts["Chest"].health.current, 85.0);
        assert!(parts["Head"].effects.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_disabled_is_noop() {
        let manager = HealingManager::default();
        let mut profile = wounded();
        manager.on_player_died(&mut profile);
        assert_eq!(profile.health.as_ref().unwrap().body_parts["Head"].health.current, 10.0);
    }
}
