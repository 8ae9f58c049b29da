//! Post-raid reward fill.

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ContentManager, HideoutManager, Outcome, ProfilesManager};
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::{Item, PmcProfile, Templates};
use crate::ids;
use crate::inventory;
use crate::presets::PresetResolver;
use crate::reference::{CASH_OUT_ITEM, CASH_OUT_RATE, HIDEOUT, ROUBLES};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
}

/// What the reward fill reads from the other managers
pub struct RewardSources<'a> {
    pub hideout: &'a HideoutManager,
    pub profiles: &'a ProfilesManager,
    pub templates: &'a Templates,
}

#[derive(Debug, Default)]
pub struct StartManager {
    config: StartConfig,
}

impl StartManager {
    /// Fill the stash after a raid.
    ///
    /// Every hideout area rolls one bonus bucket for its level, then the
    /// profile's own outcome items are added. On survival the cash-out items
    /// added by this call pay out roubles. Returns whether anything was added.
    pub fn on_player_extracted<R: Rng + ?Sized>(
        &self,
        profile: &mut PmcProfile,
        outcome: Outcome,
        game_version: &str,
        sources: &RewardSources<'_>,
        presets: &mut PresetResolver,
        rng: &mut R,
    ) -> bool {
        if !self.enabled() {
            return false;
        }
        let stash_id = profile.stash_id().unwrap_or_default().to_string();

        let mut given = Vec::new();
        let areas = profile.hideout.as_ref().map(|h| h.areas.as_slice()).unwrap_or_default();
        for area in areas {
            for bonus in sources.hideout.area_bonus(area.area_type, area.level, outcome, rng) {
                if bonus.template_id.trim().is_empty() {
                    continue;
                }
                let (low, high) = if bonus.amount_max < bonus.amount_min {
                    (bonus.amount_max, bonus.amount_min)
                } else {
                    (bonus.amount_min, bonus.amount_max)
                };
                let amount = rng.gen_range(low..=high);
                given.extend(bonus_items(&bonus.template_id, amount, &stash_id, sources.templates, rng));
            }
        }

        given.extend(
            sources
                .profiles
                .profile_bonus(game_version, outcome, &stash_id, sources.templates, presets, rng),
        );

        let mut any_given = !given.is_empty();
        // only units handed out by this extraction are cashed out
        let units: i64 = given
            .iter()
            .filter(|i| ids::same(&i.tpl, CASH_OUT_ITEM))
            .filter_map(Item::stack_count)
            .filter(|c| *c > 0)
            .sum();
        let items = &mut profile.inventory.items;
        items.extend(given);

        if outcome == Outcome::Survive && units > 0 {
            items.push(
                Item::new(ids::generate(rng), ROUBLES)
                    .with_parent(stash_id.as_str(), HIDEOUT)
                    .with_stack(units * CASH_OUT_RATE),
            );
            any_given = true;
        }

        let unplaced = inventory::fill_locations(profile, sources.templates);
        if unplaced > 0 {
            warn!(unplaced, "not every reward fits in the stash");
        }
        if any_given {
            info!(outcome = outcome.as_str(), "Starting items given!");
        }
        any_given
    }
}

impl ContentManager for StartManager {
    fn name(&self) -> &'static str {
        "Start"
    }

    fn config_name(&self) -> &'static str {
        "StartConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

// Internal helper functions

/// Instances for one rolled bonus: a single stack when possible, else one item per unit
fn bonus_items<R: Rng + ?Sized>(tpl: &str, amount: i64, stash_id: &str, templates: &Templates, rng: &mut R) -> Vec<Item> {
    if amount <= 0 {
        return Vec::new();
    }
    if amount == 1 || inventory::is_stackable(templates, tpl) {
        let mut item = Item::new(ids::generate(rng), tpl).with_parent(stash_id, HIDEOUT);
        if amount > 1 {
            item.set_stack_count(amount);
        }
        return vec![item];
    }
    (0..amount)
        .map(|_| Item::new(ids::generate(rng), tpl).with_parent(stash_id, HIDEOUT))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::PresetsConfig;
    use crate::reference::AREA_GENERATOR;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const STASH: &str = "aaaaaaaaaaaaaaaaaaaa0002";
    const BOLTS: &str = "57347c5b245977448d35f6e1";
    const ROUND: &str = "56dff3afd2720bba668b4567";
    const SALEWA: &str = "544fb45d4bdc2dee738b4568";
    const VERSION: &str = "VAI Rogue-lite Standard";

    fn templates() -> Templates {
        let mut templates = Templates::default();
        for (id, props) in [
            (BOLTS, json!({})),
            (ROUND, json!({ "StackMaxSize": 60 })),
            (SALEWA, json!({})),
            (CASH_OUT_ITEM, json!({ "StackMaxSize": 50 })),
            (ROUBLES, json!({ "StackMaxSize": 500000 })),
        ] {
            let tpl = serde_json::from_value(json!({ "_id": id, "_props": props })).unwrap();
            templates.items.insert(id.to_string(), tpl);
        }
        templates
    }

    fn managers() -> (StartManager, HideoutManager, ProfilesManager) {
        let mut ctx = Context::default();
        let mut start = StartManager::default();
        start.load_config(&ConfigTree::new(json!({ "enabled": true })), &mut ctx);

        let mut hideout = HideoutManager::default();
        hideout.load_config(
            &ConfigTree::new(json!({
                "areaTypes": {
                    "4": {
                        "stageSurviveBonuses": { "1": [[
                            { "templateId": BOLTS, "amountMin": 3, "amountMax": 3 },
                            { "templateId": ROUND, "amountMin": 20, "amountMax": 10 },
                            { "templateId": SALEWA, "amountMin": 0, "amountMax": 0 }
                        ]] },
                        "stageDeathBonuses": { "1": [[{ "templateId": SALEWA, "amountMin": 1, "amountMax": 1 }]] }
                    }
                }
            })),
            &mut ctx,
        );

        let mut profiles = ProfilesManager::default();
        profiles.load_config(
            &ConfigTree::new(json!({
                "profiles": { VERSION: { "surviveItems": [{ "templateId": CASH_OUT_ITEM, "count": 2 }] } }
            })),
            &mut ctx,
        );
        (start, hideout, profiles)
    }

    fn profile() -> PmcProfile {
        serde_json::from_value(json!({
            "Info": { "GameVersion": VERSION },
            "Inventory": {
                "stash": STASH,
                "items": [
                    { "_id": STASH, "_tpl": "566abbc34bdc2d92178b4576" },
                    { "_id": "gp", "_tpl": CASH_OUT_ITEM, "parentId": STASH, "slotId": "hideout",
                      "location": { "x": 0, "y": 0, "r": 0 }, "upd": { "StackObjectsCount": 1 } }
                ]
            },
            "Hideout": { "Areas": [{ "type": AREA_GENERATOR, "level": 1 }, { "type": 6, "level": 0 }] }
        }))
        .unwrap()
    }

    #[test]
    fn test_survive_rewards() {
        let (start, hideout, profiles) = managers();
        let templates = templates();
        let sources = RewardSources { hideout: &hideout, profiles: &profiles, templates: &templates };
        let mut presets = PresetResolver::new(PresetsConfig::default());
        let mut rng = StdRng::seed_from_u64(11);
        let mut profile = profile();

        assert!(start.on_player_extracted(&mut profile, Outcome::Survive, VERSION, &sources, &mut presets, &mut rng));

        let items = &profile.inventory.items;
        assert_eq!(items.iter().filter(|i| i.tpl == BOLTS).count(), 3);
        assert!(items.iter().filter(|i| i.tpl == BOLTS).all(|i| i.upd.is_none()));
        let rounds: Vec<&Item> = items.iter().filter(|i| i.tpl == ROUND).collect();
        assert_eq!(rounds.len(), 1);
        assert!((10..=20).contains(&rounds[0].stack_count().unwrap()));
        assert!(items.iter().all(|i| i.tpl != SALEWA));

        // the profile's two new units; the one already stashed is not paid
        let roubles: Vec<&Item> = items.iter().filter(|i| i.tpl == ROUBLES).collect();
        assert_eq!(roubles.len(), 1);
        assert_eq!(roubles[0].stack_count(), Some(2 * CASH_OUT_RATE));

        assert!(items.iter().filter(|i| i.parent_is(STASH)).all(|i| i.location.is_some()));
    }

    #[test]
    fn test_stashed_cash_out_not_paid_again() {
        let (start, hideout, _) = managers();
        let profiles = ProfilesManager::default();
        let templates = templates();
        let sources = RewardSources { hideout: &hideout, profiles: &profiles, templates: &templates };
        let mut presets = PresetResolver::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut profile = profile();

        for _ in 0..2 {
            start.on_player_extracted(&mut profile, Outcome::Survive, VERSION, &sources, &mut presets, &mut rng);
        }

        let items = &profile.inventory.items;
        assert!(items.iter().all(|i| i.tpl != ROUBLES));
        assert_eq!(items.iter().filter(|i| i.tpl == CASH_OUT_ITEM).count(), 1);
    }

    #[test]
    fn test_death_rewards_skip_cash_out() {
        let (start, hideout, profiles) = managers();
        let templates = templates();
        let sources = RewardSources { hideout: &hideout, profiles: &profiles, templates: &templates };
        let mut presets = PresetResolver::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut profile = profile();

        assert!(start.on_player_extracted(&mut profile, Outcome::Death, VERSION, &sources, &mut presets, &mut rng));
        let items = &profile.inventory.items;
        assert_eq!(items.len(), 3);
        assert!(items.iter().any(|i| i.tpl == SALEWA && i.slot_is(HIDEOUT)));
        assert!(items.iter().all(|i| i.tpl != ROUBLES));
    }

    #[test]
    fn test_disabled_gives_nothing() {
        let (_, hideout, profiles) = managers();
        let templates = templates();
        let sources = RewardSources { hideout: &hideout, profiles: &profiles, templates: &templates };
        let mut rng = StdRng::seed_from_u64(1);
        let mut profile = profile();

        let start = StartManager::default();
        assert!(!start.on_player_extracted(&mut profile, Outcome::Survive, VERSION, &sources, &mut PresetResolver::default(), &mut rng));
        assert_eq!(profile.inventory.items.len(), 2);
    }
}
