//! Shared pipeline state.
//!
//! One [`Context`] is created per process and handed to every lifecycle hook
//! and route handler. Managers publish the views other managers read (weapon
//! categories, wipe lists, the preset resolver) into it when their config
//! loads.

use std::collections::HashMap;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::lenient;
use crate::db::Database;
use crate::locale::LocaleOverlay;
use crate::presets::PresetResolver;
use crate::unlocks::{apply_unlock_reward, UnlockQueue, UnlockRequest};

/// Operator toggles. All off by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
#[allow(clippy::struct_excessive_bools)]
pub struct DebugFlags {
    /// Every listing costs one rouble
    pub minimum_prices: bool,
    pub print_presets_on_flea_enter: bool,
    pub print_new_hashes: bool,
    pub no_new_quests_start_requirements: bool,
    pub no_questlocked_items: bool,
    /// Skip quest locks naming the placeholder quest "123"
    pub ignore_mock_questlocks: bool,
    /// Every configured preset at every configured trader, loyalty level 1
    pub all_presets_unconditional: bool,
    /// Every quest finishes by handing over one rouble
    pub easy_quests: bool,
    pub print_quest_count: bool,
    pub print_preset_count: bool,
    pub print_ammo_batch_debug: bool,
    pub instant_crafting: bool,
    pub easy_crafting: bool,
}

/// Weapon categories: category → weapon id → description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeaponCatalog {
    #[serde(default, deserialize_with = "lenient::map")]
    categories: IndexMap<String, IndexMap<String, String>>,
}

impl WeaponCatalog {
    pub fn new(categories: IndexMap<String, IndexMap<String, String>>) -> Self {
        WeaponCatalog { categories }
    }

    /// (weapon id, description) pairs of a category, in config order
    pub fn category_ids(&self, category: &str) -> Vec<(String, String)> {
        self.categories
            .get(category)
            .map(|weapons| {
                weapons
                    .iter()
                    .map(|(id, desc)| (id.clone(), desc.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Description of a weapon from the first category listing it, or the id itself
    pub fn description(&self, weapon_id: &str) -> String {
        self.categories
            .values()
            .find_map(|weapons| weapons.get(weapon_id).filter(|desc| !desc.trim().is_empty()))
            .cloned()
            .unwrap_or_else(|| weapon_id.to_string())
    }
}

/// Template lists that survive a stash wipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeRules {
    /// Kept together with everything inside them
    pub secured_items: Vec<String>,
    /// Kept on their own
    pub ignored_items: Vec<String>,
}

/// Stack size and buy restriction a trader listing must keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssortOverride {
    pub stack_count: i64,
    pub buy_restriction: i64,
}

/// Listing limits keyed by (trader id, template id), both lowercased.
#[derive(Debug, Clone, Default)]
pub struct AssortOverrides {
    entries: HashMap<(String, String), AssortOverride>,
}

impl AssortOverrides {
    fn key(trader_id: &str, tpl: &str) -> (String, String) {
        (trader_id.to_ascii_lowercase(), tpl.to_ascii_lowercase())
    }

    pub fn get(&self, trader_id: &str, tpl: &str) -> Option<AssortOverride> {
        self.entries.get(&Self::key(trader_id, tpl)).copied()
    }

    /// Replace every override of a trader
    pub fn replace_trader(&mut self, trader_id: &str, overrides: impl IntoIterator<Item = (String, AssortOverride)>) {
        let trader = trader_id.to_ascii_lowercase();
        self.entries.retain(|(t, _), _| *t != trader);
        for (tpl, value) in overrides {
            self.entries.insert(Self::key(trader_id, &tpl), value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the managers and routes share besides the database.
#[derive(Debug)]
pub struct Context {
    pub debug: DebugFlags,
    pub rng: StdRng,
    pub locale: LocaleOverlay,
    pub presets: PresetResolver,
    pub weapons: WeaponCatalog,
    pub wipe_rules: WipeRules,
    pub unlocks: UnlockQueue,
    pub assort_overrides: AssortOverrides,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DebugFlags::default(), None)
    }
}

impl Context {
    /// A context with a fixed RNG seed, or an entropy-seeded one
    pub fn new(debug: DebugFlags, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Context {
            debug,
            rng,
            locale: LocaleOverlay::new(),
            presets: PresetResolver::default(),
            weapons: WeaponCatalog::default(),
            wipe_rules: WipeRules::default(),
            unlocks: UnlockQueue::new(),
            assort_overrides: AssortOverrides::default(),
        }
    }

    /// Attach an unlock reward now if every quest exists, otherwise queue it
    pub fn request_unlock(&mut self, db: &mut Database, request: UnlockRequest) {
        if self.unlocks.is_ready() {
            apply_unlock_reward(db, &request);
        } else {
            self.unlocks.push(request);
        }
    }

    /// Apply every queued unlock. Called once all quests are defined.
    pub fn flush_unlocks(&mut self, db: &mut Database) -> usize {
        self.unlocks.mark_ready();
        let pending = self.unlocks.drain();
        let total = pending.len();
        let applied = pending
            .iter()
            .filter(|request| apply_unlock_reward(db, request))
            .count();
        debug!(total, applied, "unlock queue flushed");
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Quest;
    use rand::Rng;
    use serde_json::json;

    const QUEST: &str = "cccccccccccccccccccccccc";

    fn request() -> UnlockRequest {
        UnlockRequest {
            quest_id: QUEST.to_string(),
            loyalty_level: 1,
            trader_id: crate::reference::PRAPOR.to_string(),
            item_id: "dddddddddddddddddddddddd".to_string(),
            template_id: None,
            preset_items: None,
            quest_state: "success".to_string(),
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = Context::new(DebugFlags::default(), Some(7));
        let mut b = Context::new(DebugFlags::default(), Some(7));
        assert_eq!(a.rng.gen::<u64>(), b.rng.gen::<u64>());
    }

    #[test]
    fn test_unlock_requested_before_quest_exists() {
        let mut ctx = Context::default();
        let mut db = Database::default();
        ctx.request_unlock(&mut db, request());
        assert_eq!(ctx.unlocks.len(), 1);

        let quest: Quest = serde_json::from_value(json!({
            "_id": QUEST,
            "rewards": { "Started": [], "Success": [], "Fail": [] }
        }))
        .unwrap();
        db.templates.quests.insert(QUEST.to_string(), quest);

        assert_eq!(ctx.flush_unlocks(&mut db), 1);
        assert_eq!(db.templates.quests[QUEST].rewards["Success"].len(), 1);

        ctx.request_unlock(&mut db, request());
        assert!(ctx.unlocks.is_empty());
        assert_eq!(db.templates.quests[QUEST].rewards["Success"].len(), 2);
    }

    #[test]
    fn test_weapon_catalog_lookups() {
        let catalog: WeaponCatalog = serde_json::from_value(json!({
            "categories": {
                "pistols": { "aaa": "Makarov", "bbb": "" },
                "rifles": { "bbb": "Glock", "ccc": "AK" },
                "broken": 5
            }
        }))
        .unwrap();
        assert_eq!(catalog.description("aaa"), "Makarov");
        assert_eq!(catalog.description("bbb"), "Glock");
        assert_eq!(catalog.description("zzz"), "zzz");
        assert_eq!(
            catalog.category_ids("rifles"),
            vec![("bbb".to_string(), "Glock".to_string()), ("ccc".to_string(), "AK".to_string())]
        );
        assert!(catalog.category_ids("broken").is_empty());
    }

    #[test]
    fn test_assort_overrides_replace_per_trader() {
        let mut overrides = AssortOverrides::default();
        let limit = AssortOverride {
            stack_count: 30,
            buy_restriction: 3,
        };
        overrides.replace_trader("T1", [("AMMO".to_string(), limit)]);
        overrides.replace_trader("t2", [("ammo".to_string(), limit)]);
        assert_eq!(overrides.get("t1", "ammo"), Some(limit));

        overrides.replace_trader("t1", []);
        assert_eq!(overrides.get("t1", "ammo"), None);
        assert_eq!(overrides.len(), 1);
    }
}
