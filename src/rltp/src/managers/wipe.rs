//! Stash wipe on death.
//!
//! Everything in the inventory is discarded except the secured set: the
//! secured container and its contents, configured secured templates with
//! their contents, configured ignored templates, the inventory roots,
//! pockets, quest item containers and the scabbard.

use std::collections::HashSet;

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::{Context, WipeRules};
use crate::db::{Item, PmcProfile, Templates};
use crate::ids;
use crate::inventory;
use crate::reference::{DEFAULT_INVENTORY, DEFAULT_POCKETS};

/// Bound on subtree expansion rounds for secured containers
const SUBTREE_ROUNDS: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WipeConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub secured_items: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub ignored_items: Vec<String>,
}

#[derive(Debug, Default)]
pub struct WipeManager {
    config: WipeConfig,
}

impl WipeManager {
    /// Wipe the stash. No-op when disabled.
    pub fn on_player_died<R: Rng + ?Sized>(
        &self,
        profile: &mut PmcProfile,
        templates: &Templates,
        rng: &mut R,
    ) {
        if !self.enabled() {
            return;
        }
        let rules = WipeRules {
            secured_items: self.config.secured_items.clone(),
            ignored_items: self.config.ignored_items.clone(),
        };
        clear_profile_stash(profile, templates, &rules, rng);
        info!("Stash wiped");
    }
}

impl ContentManager for WipeManager {
    fn name(&self) -> &'static str {
        "Wipe"
    }

    fn config_name(&self) -> &'static str {
        "WipeConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, ctx: &mut Context) {
        self.config = tree.project(self.config_name());
        ctx.wipe_rules = WipeRules {
            secured_items: self.config.secured_items.clone(),
            ignored_items: self.config.ignored_items.clone(),
        };
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Remove every non-secured item and repair the pockets slot if it went missing.
pub fn clear_profile_stash<R: Rng + ?Sized>(
    profile: &mut PmcProfile,
    templates: &Templates,
    rules: &WipeRules,
    rng: &mut R,
) {
    let pockets_tpl = resolve_pockets_template(&profile.inventory.items, templates);
    let equipment_id = ensure_equipment_root(profile, rng);

    let secured = secured_ids(profile, rules, pockets_tpl.as_deref());
    profile
        .inventory
        .items
        .retain(|item| secured.contains(&item.id.to_ascii_lowercase()));

    let has_pockets = profile.inventory.items.iter().any(|i| i.slot_is("Pockets"));
    if !has_pockets {
        warn!("pockets missing, fixing");
        let tpl = pockets_tpl.unwrap_or_else(|| DEFAULT_POCKETS.to_string());
        let pockets = Item::new(ids::generate(rng), tpl).with_parent(equipment_id, "Pockets");
        profile.inventory.items.push(pockets);
    }
}

// Internal helper functions

/// Lowercased ids of everything that survives the wipe
fn secured_ids(profile: &PmcProfile, rules: &WipeRules, pockets_tpl: Option<&str>) -> HashSet<String> {
    let inventory = &profile.inventory;
    let items = &inventory.items;
    let mut secured = HashSet::new();

    if let Some(container) = items.iter().find(|i| i.slot_is("SecuredContainer")) {
        add_subtree(&mut secured, items, &container.id);
    }

    let listed = |list: &Vec<String>, tpl: &str| list.iter().any(|t| ids::same(t, tpl));
    for item in items.iter().filter(|i| !i.tpl.trim().is_empty()) {
        if listed(&rules.secured_items, &item.tpl) {
            add_subtree(&mut secured, items, &item.id);
        }
        if listed(&rules.ignored_items, &item.tpl) {
            secured.insert(item.id.to_ascii_lowercase());
        }
    }

    let roots = [
        inventory.stash.as_deref(),
        inventory.equipment.as_deref(),
        inventory.quest_raid_items.as_deref(),
        inventory.quest_stash_items.as_deref(),
        inventory.sorting_table.as_deref(),
    ];
    for root in roots
        .into_iter()
        .flatten()
        .chain(inventory.hideout_area_stashes.values().map(String::as_str))
    {
        if !root.trim().is_empty() {
            secured.insert(root.to_ascii_lowercase());
        }
    }

    for item in items {
        let is_pockets = item.slot_is("Pockets") || pockets_tpl.is_some_and(|tpl| ids::same(&item.tpl, tpl));
        let quest_parent = [&inventory.quest_raid_items, &inventory.quest_stash_items]
            .into_iter()
            .flatten()
            .any(|container| item.parent_is(container));
        if is_pockets || quest_parent {
            secured.insert(item.id.to_ascii_lowercase());
        }
    }

    if let Some(scabbard) = items.iter().find(|i| i.slot_is("Scabbard")) {
        secured.insert(scabbard.id.to_ascii_lowercase());
    }

    secured
}

fn add_subtree(ids: &mut HashSet<String>, items: &[Item], root_id: &str) {
    if root_id.trim().is_empty() {
        return;
    }
    ids.insert(root_id.to_ascii_lowercase());

    for _ in 0..SUBTREE_ROUNDS {
        let before = ids.len();
        for item in items {
            let parent_known = item
                .parent_id
                .as_deref()
                .is_some_and(|p| ids.contains(&p.to_ascii_lowercase()));
            if parent_known {
                ids.insert(item.id.to_ascii_lowercase());
            }
        }
        if ids.len() == before {
            break;
        }
    }
}

/// Template of the equipped pockets, or of the first pockets-like item
fn resolve_pockets_template(items: &[Item], templates: &Templates) -> Option<String> {
    if let Some(pockets) = items.iter().find(|i| i.slot_is("Pockets")) {
        return Some(pockets.tpl.clone()).filter(|t| !t.trim().is_empty());
    }
    items
        .iter()
        .find(|i| inventory::is_pockets_template(templates, &i.tpl))
        .map(|i| i.tpl.clone())
}

/// Id of the equipment root, creating the root when it is missing
fn ensure_equipment_root<R: Rng + ?Sized>(profile: &mut PmcProfile, rng: &mut R) -> String {
    let inventory = &mut profile.inventory;
    if let Some(id) = inventory.equipment.as_deref().filter(|id| !id.trim().is_empty()) {
        if inventory.items.iter().any(|i| ids::same(&i.id, id)) {
            return id.to_string();
        }
    }

    let id = ids::generate(rng);
    inventory.items.push(Item::new(id.clone(), DEFAULT_INVENTORY));
    inventory.equipment = Some(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const EQUIPMENT: &str = "aaaaaaaaaaaaaaaaaaaa0001";
    const STASH: &str = "aaaaaaaaaaaaaaaaaaaa0002";
    const QUEST_RAID: &str = "aaaaaaaaaaaaaaaaaaaa0003";
    const POUCH_TPL: &str = "5c093ca986f7740a1867ab12";
    const POCKETS_TPL: &str = "627a4e6b255f7527fb05a0f6";
    const SALEWA_TPL: &str = "544fb45d4bdc2dee738b4568";

    fn profile() -> PmcProfile {
        serde_json::from_value(json!({
            "Inventory": {
                "equipment": EQUIPMENT,
                "stash": STASH,
                "questRaidItems": QUEST_RAID,
                "items": [
                    { "_id": EQUIPMENT, "_tpl": DEFAULT_INVENTORY },
                    { "_id": STASH, "_tpl": "566abbc34bdc2d92178b4576" },
                    { "_id": QUEST_RAID, "_tpl": "5963866286f7747bf429b572" },
                    { "_id": "x", "_tpl": POUCH_TPL, "parentId": EQUIPMENT, "slotId": "SecuredContainer" },
                    { "_id": "y", "_tpl": SALEWA_TPL, "parentId": "x", "slotId": "main" },
                    { "_id": "z", "_tpl": SALEWA_TPL, "parentId": STASH, "slotId": "hideout" },
                    { "_id": "p", "_tpl": POCKETS_TPL, "parentId": EQUIPMENT, "slotId": "Pockets" },
                    { "_id": "k", "_tpl": "57e26fc7245977162a14b800", "parentId": EQUIPMENT, "slotId": "Scabbard" },
                    { "_id": "q", "_tpl": "5939a00786f7742fe8132936", "parentId": QUEST_RAID, "slotId": "main" },
                    { "_id": "w", "_tpl": "5644bd2b4bdc2d3b4c8b4572", "parentId": EQUIPMENT, "slotId": "FirstPrimaryWeapon" }
                ]
            }
        }))
        .unwrap()
    }

    fn ids_of(profile: &PmcProfile) -> Vec<&str> {
        profile.inventory.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_wipe_keeps_secured_set() {
        let mut profile = profile();
        let mut rng = StdRng::seed_from_u64(1);
        clear_profile_stash(&mut profile, &Templates::default(), &WipeRules::default(), &mut rng);

        assert_eq!(ids_of(&profile), vec![EQUIPMENT, STASH, QUEST_RAID, "x", "y", "p", "k", "q"]);
    }

    #[test]
    fn test_secured_and_ignored_templates() {
        let mut profile = profile();
        profile.inventory.items.push(Item::new("c", "5d235bb686f77443f4331278").with_parent(STASH, "hideout"));
        profile.inventory.items.push(Item::new("c1", SALEWA_TPL).with_parent("c", "main"));
        profile.inventory.items.push(Item::new("m", "5448be9a4bdc2dfd2f8b456a").with_parent(STASH, "hideout"));
        profile.inventory.items.push(Item::new("m1", SALEWA_TPL).with_parent("m", "main"));

        let rules = WipeRules {
            secured_items: vec!["5D235BB686F77443F4331278".to_string()],
            ignored_items: vec!["5448be9a4bdc2dfd2f8b456a".to_string()],
        };
        let mut rng = StdRng::seed_from_u64(1);
        clear_profile_stash(&mut profile, &Templates::default(), &rules, &mut rng);

        let kept = ids_of(&profile);
        assert!(kept.contains(&"c") && kept.contains(&"c1"));
        assert!(kept.contains(&"m"));
        assert!(!kept.contains(&"m1"));
    }

    #[test]
    fn test_missing_pockets_are_repaired() {
        let mut profile = profile();
        profile.inventory.items.retain(|i| i.id != "p");
        let mut rng = StdRng::seed_from_u64(1);
        clear_profile_stash(&mut profile, &Templates::default(), &WipeRules::default(), &mut rng);

        let pockets: Vec<&Item> = profile.inventory.items.iter().filter(|i| i.slot_is("Pockets")).collect();
        assert_eq!(pockets.len(), 1);
        assert_eq!(pockets[0].tpl, DEFAULT_POCKETS);
        assert!(pockets[0].parent_is(EQUIPMENT));
        assert!(ids::is_valid(&pockets[0].id));
    }

    #[test]
    fn test_missing_equipment_root_is_created() {
        let mut profile = profile();
        profile.inventory.items.retain(|i| i.id != EQUIPMENT);
        let mut rng = StdRng::seed_from_u64(1);
        clear_profile_stash(&mut profile, &Templates::default(), &WipeRules::default(), &mut rng);

        let equipment = profile.inventory.equipment.clone().unwrap();
        assert_ne!(equipment, EQUIPMENT);
        let root = profile.inventory.find(&equipment).unwrap();
        assert_eq!(root.tpl, DEFAULT_INVENTORY);
    }

    #[test]
    fn test_disabled_manager_keeps_everything() {
        let manager = WipeManager::default();
        let mut profile = profile();
        let mut rng = StdRng::seed_from_u64(1);
        manager.on_player_died(&mut profile, &Templates::default(), &mut rng);
        assert_eq!(profile.inventory.items.len(), 10);
    }

    #[test]
    fn test_rules_published_when_disabled() {
        let mut ctx = Context::default();
        let mut manager = WipeManager::default();
        manager.load_config(&ConfigTree::new(json!({ "securedItems": [POUCH_TPL] })), &mut ctx);
        assert_eq!(ctx.wipe_rules.secured_items, vec![POUCH_TPL.to_string()]);
    }
}
