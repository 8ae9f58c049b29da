//! Starting profiles and live profile repair.
//!
//! New selectable profiles are cloned from an existing template, stripped of
//! their stash, and re-seeded from config. The same config drives the
//! per-profile raid bonuses and the completed-quest seed applied on the
//! first profile status request.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;
use tracing::{error, info};

use super::quests::QuestsConfig;
use super::wipe::clear_profile_stash;
use super::{ContentManager, Outcome};
use crate::config::{lenient, load_or_empty, ConfigSource, ConfigTree};
use crate::context::{Context, WipeRules};
use crate::db::profile::{quest_state, ProfileSide, QuestStatus};
use crate::db::{Database, Item, PmcProfile, ProfileTemplate, Templates};
use crate::host::Session;
use crate::ids;
use crate::inventory;
use crate::presets::{PresetResolver, ResolvedPreset};
use crate::reference::{area_by_name, trader_records, GAME_VERSION_PREFIX, HIDEOUT};

/// Sentinel in `completedQuests` meaning every quest in the database
pub const ALL_QUESTS: &str = "__all__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartingLevel {
    #[serde(deserialize_with = "lenient::int")]
    pub starting_level: i64,
}

/// A starting item or preset placed into the new profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileItemConfig {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub template_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub preset_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_int")]
    pub count: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub parent_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub slot_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
}

impl ProfileItemConfig {
    fn template(&self) -> Option<&str> {
        self.template_id.as_deref().filter(|t| !t.trim().is_empty())
    }

    fn preset(&self) -> Option<&str> {
        self.preset_id.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Random weapon preset handed out on death
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GungameConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::vec")]
    pub preset_categories: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub exclude_presets: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub include_presets: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileConfig {
    /// Name of the profile template to clone
    #[serde(deserialize_with = "lenient::string")]
    pub copy_source: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub actual_description: String,
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_all_items: bool,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub traders_standing: Option<f64>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub jaeger_unlocked: bool,
    /// area type number or name → starting level
    #[serde(deserialize_with = "lenient::map")]
    pub areas: IndexMap<String, StartingLevel>,
    #[serde(deserialize_with = "lenient::vec")]
    pub items: Vec<ProfileItemConfig>,
    /// skill id → starting level; present at all means mastering is reset
    #[serde(deserialize_with = "lenient::lenient")]
    pub skills: Option<IndexMap<String, StartingLevel>>,
    #[serde(deserialize_with = "lenient::vec")]
    pub death_items: Vec<ProfileItemConfig>,
    #[serde(deserialize_with = "lenient::vec")]
    pub survive_items: Vec<ProfileItemConfig>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub gungame: GungameConfig,
    #[serde(deserialize_with = "lenient::vec")]
    pub completed_quests: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    /// profile name (also the game version it stamps) → settings
    #[serde(deserialize_with = "lenient::map")]
    pub profiles: IndexMap<String, ProfileConfig>,
}

#[derive(Debug, Default)]
pub struct ProfilesManager {
    config: ProfilesConfig,
    /// Lowercased ids of the authored mastery and collector quests
    custom_quest_ids: HashSet<String>,
}

impl ProfilesManager {
    pub fn profile(&self, game_version: &str) -> Option<&ProfileConfig> {
        self.config.profiles.get(game_version)
    }

    pub fn custom_quest_ids(&self) -> &HashSet<String> {
        &self.custom_quest_ids
    }

    /// Items a profile earns for a raid outcome, parented to `parent_id`.
    ///
    /// On death a random gungame preset is added when configured.
    pub fn profile_bonus<R: Rng + ?Sized>(
        &self,
        game_version: &str,
        outcome: Outcome,
        parent_id: &str,
        templates: &Templates,
        presets: &mut PresetResolver,
        rng: &mut R,
    ) -> Vec<Item> {
        let Some(profile) = self.profile(game_version) else {
            return Vec::new();
        };
        let configs = match outcome {
            Outcome::Death => &profile.death_items,
            Outcome::Survive => &profile.survive_items,
        };

        let mut result = Vec::new();
        for config in configs {
            if let Some(tpl) = config.template() {
                if !ids::is_valid(tpl) {
                    continue;
                }
                let count = config.count.unwrap_or(1);
                let stackable = inventory::is_stackable(templates, tpl);
                if count <= 1 || stackable {
                    let mut item = Item::new(ids::generate(rng), tpl).with_parent(parent_id, HIDEOUT);
                    if stackable {
                        item.set_stack_count(count);
                    }
                    result.push(item);
                } else {
                    for _ in 0..count {
                        result.push(
                            Item::new(ids::generate(rng), tpl)
                                .with_parent(parent_id, HIDEOUT)
                                .with_stack(1),
                        );
                    }
                }
            } else if let Some(preset_id) = config.preset() {
                if let Some(preset) = presets.resolve(preset_id, Some(parent_id), rng) {
                    result.extend(single_stack(preset));
                }
            }
        }

        let gungame = &profile.gungame;
        if outcome == Outcome::Death && gungame.enabled {
            let preset = presets.resolve_random(
                &non_blank(&gungame.preset_categories),
                &non_blank(&gungame.exclude_presets),
                &non_blank(&gungame.include_presets),
                Some(parent_id),
                rng,
            );
            if let Some(preset) = preset {
                result.extend(single_stack(preset));
            }
        }

        result
    }

    /// Repair a rogue-lite profile on the profile status request and save it if anything changed
    pub fn handle_profile_status(&self, session: &mut Session<'_>, db: &Database) {
        if !self.enabled() {
            return;
        }
        let Some(profile) = session.profile_mut() else {
            return;
        };
        if !is_rogue_lite(profile) {
            return;
        }

        let mut dirty = self.seed_completed_quests(profile, db);
        dirty |= fix_stash_locations(profile, &db.templates);
        dirty |= self.normalize_custom_quest_statuses(profile, db);

        if dirty {
            session.save();
        }
    }

    /// Reset authored quests left "started" without a start time.
    ///
    /// Such quests go back to available-for-start with no completed
    /// conditions, only the available timer is kept, and the condition
    /// counters of their finish conditions are zeroed. Returns whether the
    /// profile changed.
    pub fn normalize_custom_quest_statuses(&self, profile: &mut PmcProfile, db: &Database) -> bool {
        if self.custom_quest_ids.is_empty() {
            return false;
        }
        let Some(quests) = profile.quests.as_mut() else {
            return false;
        };

        let mut reset = Vec::new();
        for status in quests.iter_mut() {
            if status.qid.trim().is_empty() || !self.custom_quest_ids.contains(&status.qid.to_ascii_lowercase()) {
                continue;
            }
            if status.status != quest_state::STARTED || status.start_time > 0.0 {
                continue;
            }
            let Some(available) = status.timer(quest_state::AVAILABLE_FOR_START) else {
                continue;
            };
            if status.timer(quest_state::STARTED).is_none() {
                continue;
            }

            status.status = quest_state::AVAILABLE_FOR_START;
            status.start_time = 0.0;
            status.completed_conditions.clear();
            status
                .status_timers
                .retain(|key, _| quest_state::parse(key) == Some(quest_state::AVAILABLE_FOR_START));
            if let Some(timer) = status.status_timers.values_mut().next() {
                *timer = available;
            }
            reset.push(status.qid.clone());
        }

        for quest_id in &reset {
            reset_quest_counters(profile, db, quest_id);
        }
        !reset.is_empty()
    }

    /// Mark the configured quests finished on a profile with no quest history
    fn seed_completed_quests(&self, profile: &mut PmcProfile, db: &Database) -> bool {
        let Some(config) = profile.game_version().and_then(|v| self.profile(v)) else {
            return false;
        };
        if config.completed_quests.is_empty() {
            return false;
        }
        let Some(quests) = profile.quests.as_mut().filter(|q| q.is_empty()) else {
            return false;
        };

        let quest_ids: Vec<String> = if config.completed_quests.iter().any(|q| q.eq_ignore_ascii_case(ALL_QUESTS)) {
            db.templates.quests.keys().cloned().collect()
        } else {
            config.completed_quests.clone()
        };

        let mut added = false;
        for quest_id in quest_ids.iter().filter(|q| !q.trim().is_empty()) {
            let quest = ids::is_valid(quest_id).then(|| db.templates.quest(quest_id)).flatten();
            let Some(quest) = quest else {
                error!(quest = %quest_id, "Could not find quest");
                continue;
            };

            quests.push(QuestStatus {
                qid: quest.id.clone(),
                status: quest_state::AVAILABLE_FOR_FINISH,
                completed_conditions: quest
                    .conditions
                    .available_for_finish
                    .iter()
                    .map(|c| c.id.clone())
                    .filter(|id| !id.trim().is_empty())
                    .collect(),
                ..Default::default()
            });
            added = true;
        }

        if added {
            info!(nickname = profile.info.nickname.as_deref().unwrap_or_default(), "Quests set for profile");
        }
        added
    }

    fn build_profile<R: Rng + ?Sized>(
        &self,
        name: &str,
        config: &ProfileConfig,
        source: &ProfileTemplate,
        templates: &Templates,
        ctx: (&mut PresetResolver, &WipeRules, &mut R),
    ) -> ProfileTemplate {
        let (presets, wipe_rules, rng) = ctx;
        let mut profile = source.clone();
        for side in [profile.bear.as_mut(), profile.usec.as_mut()].into_iter().flatten() {
            set_side(name, config, side, templates, presets, wipe_rules, rng);
        }
        profile.description_locale_key = format!("{}\n\n{}", config.description, config.actual_description);
        profile
    }
}

impl ContentManager for ProfilesManager {
    fn name(&self) -> &'static str {
        "Profiles"
    }

    fn config_name(&self) -> &'static str {
        "ProfilesConfig"
    }

    fn priority(&self) -> i32 {
        3
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn pre_load(&mut self, source: &dyn ConfigSource, _ctx: &mut Context) {
        let quests: QuestsConfig = load_or_empty(source, "QuestsConfig").project("QuestsConfig");
        self.custom_quest_ids = quests
            .mastery_quests
            .values()
            .map(|q| q.id.as_str())
            .chain(quests.collector_quests.values().map(|q| q.id.as_str()))
            .filter(|id| !id.trim().is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let Context { presets, wipe_rules, rng, .. } = ctx;

        let mut built = Vec::new();
        for (name, config) in &self.config.profiles {
            if config.copy_source.trim().is_empty() {
                continue;
            }
            let Some(source) = db.templates.profiles.get(&config.copy_source) else {
                continue;
            };
            let profile = self.build_profile(name, config, source, &db.templates, (&mut *presets, &*wipe_rules, &mut *rng));
            built.push((name.clone(), profile));
        }

        db.templates.profiles.extend(built);
        info!("New profiles added!");
    }
}

// Internal helper functions

fn is_rogue_lite(profile: &PmcProfile) -> bool {
    profile.game_version().is_some_and(|v| {
        v.get(..GAME_VERSION_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(GAME_VERSION_PREFIX))
    })
}

fn non_blank(list: &[String]) -> Vec<String> {
    list.iter().filter(|s| !s.trim().is_empty()).cloned().collect()
}

/// Preset items with the root forced to a single stack
fn single_stack(mut preset: ResolvedPreset) -> Vec<Item> {
    if let Some(root) = preset.root_mut() {
        if root.upd.is_some() {
            root.set_stack_count(1);
        }
    }
    preset.items
}

fn fix_stash_locations(profile: &mut PmcProfile, templates: &Templates) -> bool {
    let Some(stash_id) = profile.stash_id().map(str::to_string) else {
        return false;
    };
    let needs_fix = profile
        .inventory
        .items
        .iter()
        .any(|item| item.parent_is(&stash_id) && item.location.is_none());
    if !needs_fix {
        return false;
    }
    inventory::fill_locations(profile, templates);
    true
}

fn reset_quest_counters(profile: &mut PmcProfile, db: &Database, quest_id: &str) -> bool {
    if !ids::is_valid(quest_id) {
        return false;
    }
    let Some(quest) = db.templates.quest(quest_id) else {
        return false;
    };
    let condition_ids: HashSet<String> = quest
        .conditions
        .available_for_finish
        .iter()
        .map(|c| c.id.to_ascii_lowercase())
        .filter(|id| !id.trim().is_empty())
        .collect();
    let Some(counters) = profile.task_condition_counters.as_mut() else {
        return false;
    };

    let mut changed = false;
    for counter in counters.values_mut() {
        if condition_ids.contains(&counter.source_id.to_ascii_lowercase()) && counter.value != 0.0 {
            counter.value = 0.0;
            changed = true;
        }
    }
    changed
}

fn set_side<R: Rng + ?Sized>(
    name: &str,
    config: &ProfileConfig,
    side: &mut ProfileSide,
    templates: &Templates,
    presets: &mut PresetResolver,
    wipe_rules: &WipeRules,
    rng: &mut R,
) {
    let Some(character) = side.character.as_mut() else {
        return;
    };

    clear_profile_stash(character, templates, wipe_rules, rng);

    let stash_id = character.stash_id().unwrap_or_default().to_string();
    let items = &mut character.inventory.items;
    items.retain(|item| !item.parent_is(&stash_id));
    if config.clear_all_items {
        items.retain(|item| !(item.slot_is("Scabbard") || item.slot_is("SecuredContainer")));
    }

    character.info.game_version = Some(name.to_string());

    let trader = &mut side.trader;
    if trader.initial_loyalty_level.is_empty() {
        trader.initial_loyalty_level = trader_records(1).into_iter().collect();
    }
    trader
        .initial_standing
        .insert("default".to_string(), config.traders_standing);
    trader.initial_sales_sum = 0.0;
    trader.jaeger_unlocked = config.jaeger_unlocked;

    if let Some(hideout) = character.hideout.as_mut() {
        for (key, area) in &config.areas {
            let area_type = key.parse::<i64>().ok().or_else(|| area_by_name(key));
            let Some(area_type) = area_type else {
                continue;
            };
            if let Some(state) = hideout.areas.iter_mut().find(|a| a.area_type == area_type) {
                state.level = area.starting_level;
            }
        }
    }

    for item in &config.items {
        add_configured_item(item, &mut character.inventory.items, &stash_id, templates, presets, rng);
    }

    if let (Some(levels), Some(skills)) = (&config.skills, character.skills.as_mut()) {
        for (skill_id, level) in levels {
            for skill in skills.common.iter_mut().filter(|s| s.id.eq_ignore_ascii_case(skill_id)) {
                skill.progress = level.starting_level as f64;
            }
        }
        skills.mastering.clear();
        skills.points = 0.0;
    }

    let unplaced = inventory::fill_locations(character, templates);
    if unplaced > 0 {
        error!(profile = name, unplaced, "starting items did not fit in the stash");
    }
}

fn add_configured_item<R: Rng + ?Sized>(
    config: &ProfileItemConfig,
    items: &mut Vec<Item>,
    stash_id: &str,
    templates: &Templates,
    presets: &mut PresetResolver,
    rng: &mut R,
) {
    if let Some(tpl) = config.template() {
        if !ids::is_valid(tpl) {
            return;
        }
        let count = config.count.unwrap_or(1);
        let parent_id = config.parent_id.as_deref().unwrap_or(stash_id);
        let slot_id = config.slot_id.as_deref().unwrap_or(HIDEOUT);

        if count <= 1 || inventory::is_stackable(templates, tpl) {
            let id = config
                .id
                .clone()
                .filter(|id| ids::is_valid(id))
                .unwrap_or_else(|| ids::generate(rng));
            let mut item = Item::new(id, tpl).with_parent(parent_id, slot_id);
            if count > 1 {
                item.set_stack_count(count);
            }
            items.push(item);
        } else {
            for _ in 0..count {
                items.push(
                    Item::new(ids::generate(rng), tpl)
                        .with_parent(parent_id, slot_id)
                        .with_stack(1),
                );
            }
        }
    }

    if let Some(preset_id) = config.preset() {
        if let Some(preset) = presets.resolve(preset_id, Some(stash_id), rng) {
            items.extend(single_stack(preset));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigSource;
    use crate::db::quest::Quest;
    use crate::host::MemoryProfileStore;
    use crate::presets::PresetsConfig;
    use crate::reference::{AREA_GENERATOR, DEFAULT_INVENTORY, PRAPOR};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const EQUIPMENT: &str = "aaaaaaaaaaaaaaaaaaaa0001";
    const STASH: &str = "aaaaaaaaaaaaaaaaaaaa0002";
    const SALEWA: &str = "544fb45d4bdc2dee738b4568";
    const ROUND: &str = "56dff3afd2720bba668b4567";
    const AK: &str = "5644bd2b4bdc2d3b4c8b4572";
    const QUEST: &str = "5936d90786f7742b1420ba5b";
    const CUSTOM_QUEST: &str = "aaaaaaaaaaaaaaaaaaaaaa01";
    const VERSION: &str = "VAI Rogue-lite Hardcore";

    fn templates() -> Templates {
        let mut templates = Templates::default();
        let round = serde_json::from_value(json!({ "_id": ROUND, "_props": { "StackMaxSize": 60 } })).unwrap();
        templates.items.insert(ROUND.to_string(), round);
        let salewa = serde_json::from_value(json!({ "_id": SALEWA, "_props": { "Width": 1, "Height": 1 } })).unwrap();
        templates.items.insert(SALEWA.to_string(), salewa);
        let quest: Quest = serde_json::from_value(json!({
            "_id": QUEST,
            "conditions": { "AvailableForFinish": [{ "id": "c1" }, { "id": "c2" }] }
        }))
        .unwrap();
        templates.quests.insert(QUEST.to_string(), quest);
        let custom: Quest = serde_json::from_value(json!({
            "_id": CUSTOM_QUEST,
            "conditions": { "AvailableForFinish": [{ "id": "k1" }] }
        }))
        .unwrap();
        templates.quests.insert(CUSTOM_QUEST.to_string(), custom);
        templates
    }

    fn character() -> serde_json::Value {
        json!({
            "_id": "pmc",
            "Info": { "GameVersion": "standard" },
            "Inventory": {
                "equipment": EQUIPMENT,
                "stash": STASH,
                "items": [
                    { "_id": EQUIPMENT, "_tpl": DEFAULT_INVENTORY },
                    { "_id": STASH, "_tpl": "566abbc34bdc2d92178b4576" },
                    { "_id": "pk", "_tpl": "627a4e6b255f7527fb05a0f6", "parentId": EQUIPMENT, "slotId": "Pockets" },
                    { "_id": "kn", "_tpl": "57e26fc7245977162a14b800", "parentId": EQUIPMENT, "slotId": "Scabbard" },
                    { "_id": "old", "_tpl": SALEWA, "parentId": STASH, "slotId": "hideout" }
                ]
            },
            "Hideout": { "Areas": [{ "type": AREA_GENERATOR, "level": 0 }, { "type": 6, "level": 0 }] },
            "Skills": {
                "Common": [{ "Id": "Endurance", "Progress": 10 }, { "Id": "Strength", "Progress": 5 }],
                "Mastering": [{ "Id": "AK74", "Progress": 100 }],
                "Points": 3
            }
        })
    }

    fn config() -> serde_json::Value {
        json!({
            "enabled": true,
            "profiles": {
                VERSION: {
                    "copySource": "Standard",
                    "description": "Hardcore",
                    "actualDescription": "Nothing to start with",
                    "clearAllItems": true,
                    "tradersStanding": 0.2,
                    "jaegerUnlocked": true,
                    "areas": { "generator": { "startingLevel": 1 }, "6": { "startingLevel": 2 } },
                    "items": [
                        { "templateId": SALEWA, "count": 2 },
                        { "templateId": ROUND, "count": 30 },
                        { "templateId": "broken", "count": 1 }
                    ],
                    "skills": { "endurance": { "startingLevel": 100 } },
                    "deathItems": [{ "templateId": SALEWA, "count": 3 }, { "templateId": ROUND, "count": 50 }],
                    "surviveItems": [{ "templateId": SALEWA }],
                    "gungame": { "enabled": true, "presetCategories": ["rifles"] },
                    "completedQuests": [QUEST, "ffffffffffffffffffffffff"]
                }
            }
        })
    }

    fn context() -> Context {
        let mut ctx = Context::new(Default::default(), Some(7));
        let presets: PresetsConfig = serde_json::from_value(json!({
            "categorizedItems": { "rifles": { "ak_gungame": [{ "_id": "r", "_tpl": AK }] } }
        }))
        .unwrap();
        ctx.presets = PresetResolver::new(presets);
        ctx
    }

    fn manager(ctx: &mut Context) -> ProfilesManager {
        let mut manager = ProfilesManager::default();
        manager.load_config(&ConfigTree::new(config()), ctx);
        let source = MemoryConfigSource::new()
            .with("QuestsConfig", json!({ "masteryQuests": { "M": { "id": CUSTOM_QUEST } } }));
        manager.pre_load(&source, ctx);
        manager
    }

    #[test]
    fn test_adds_cloned_profile() {
        let mut ctx = context();
        let mut db = Database::default();
        db.templates = templates();
        let source: ProfileTemplate = serde_json::from_value(json!({
            "bear": { "character": character(), "trader": { "initialStanding": { "default": 0 } } },
            "usec": { "character": character() },
            "descriptionLocaleKey": "standard description"
        }))
        .unwrap();
        db.templates.profiles.insert("Standard".to_string(), source.clone());

        let mut manager = manager(&mut ctx);
        manager.post_db(&mut db, &mut ctx);

        assert_eq!(db.templates.profiles["Standard"], source);
        let profile = &db.templates.profiles[VERSION];
        assert_eq!(profile.description_locale_key, "Hardcore\n\nNothing to start with");

        let side = profile.bear.as_ref().unwrap();
        assert_eq!(side.trader.initial_standing["default"], Some(0.2));
        assert_eq!(side.trader.initial_loyalty_level[PRAPOR], 1);
        assert!(side.trader.jaeger_unlocked);

        let character = side.character.as_ref().unwrap();
        assert_eq!(character.game_version(), Some(VERSION));
        let items = &character.inventory.items;
        assert!(items.iter().all(|i| i.id != "old" && i.id != "kn"));
        assert_eq!(items.iter().filter(|i| i.tpl == SALEWA).count(), 2);
        let rounds: Vec<&Item> = items.iter().filter(|i| i.tpl == ROUND).collect();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].stack_count(), Some(30));
        assert!(items.iter().filter(|i| i.parent_is(STASH)).all(|i| i.location.is_some()));

        let areas = &character.hideout.as_ref().unwrap().areas;
        assert_eq!(areas[0].level, 1);
        assert_eq!(areas[1].level, 2);

        let skills = character.skills.as_ref().unwrap();
        assert_eq!(skills.common[0].progress, 100.0);
        assert_eq!(skills.common[1].progress, 5.0);
        assert!(skills.mastering.is_empty());
        assert_eq!(skills.points, 0.0);
    }

    #[test]
    fn test_profile_bonus() {
        let mut ctx = context();
        let manager = manager(&mut ctx);
        let templates = templates();
        let mut rng = StdRng::seed_from_u64(3);

        let death = manager.profile_bonus(VERSION, Outcome::Death, STASH, &templates, &mut ctx.presets, &mut rng);
        assert_eq!(death.iter().filter(|i| i.tpl == SALEWA).count(), 3);
        let rounds: Vec<&Item> = death.iter().filter(|i| i.tpl == ROUND).collect();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].stack_count(), Some(50));
        let gun = death.iter().find(|i| i.tpl == AK).unwrap();
        assert!(gun.parent_is(STASH));
        assert_eq!(gun.stack_count(), Some(1));
        assert!(death.iter().all(|i| i.slot_is(HIDEOUT)));

        let survive = manager.profile_bonus(VERSION, Outcome::Survive, STASH, &templates, &mut ctx.presets, &mut rng);
        assert_eq!(survive.len(), 1);
        assert_eq!(survive[0].stack_count(), None);

        assert!(manager
            .profile_bonus("unknown", Outcome::Death, STASH, &templates, &mut ctx.presets, &mut rng)
            .is_empty());
    }

    #[test]
    fn test_profile_status_seeds_quests_and_places_items() {
        let mut ctx = context();
        let manager = manager(&mut ctx);
        let mut db = Database::default();
        db.templates = templates();

        let mut live: PmcProfile = serde_json::from_value(character()).unwrap();
        live.info.game_version = Some(VERSION.to_string());
        live.quests = Some(Vec::new());
        let mut store = MemoryProfileStore::new().with("s1", live);

        manager.handle_profile_status(&mut Session::new("s1", &mut store), &db);

        let profile = store.profile("s1").unwrap();
        let quests = profile.quests.as_ref().unwrap();
        assert_eq!(quests.len(), 1);
        assert_eq!(quests[0].qid, QUEST);
        assert_eq!(quests[0].status, quest_state::AVAILABLE_FOR_FINISH);
        assert_eq!(quests[0].completed_conditions, vec!["c1".to_string(), "c2".to_string()]);
        assert!(profile.inventory.find("old").unwrap().location.is_some());
        assert_eq!(store.saves(), ["s1".to_string()]);

        // second request has nothing left to do
        manager.handle_profile_status(&mut Session::new("s1", &mut store), &db);
        assert_eq!(store.saves().len(), 1);
    }

    #[test]
    fn test_profile_status_ignores_other_profiles() {
        let mut ctx = context();
        let manager = manager(&mut ctx);
        let mut db = Database::default();
        db.templates = templates();

        let mut live: PmcProfile = serde_json::from_value(character()).unwrap();
        live.quests = Some(Vec::new());
        let mut store = MemoryProfileStore::new().with("s1", live);
        manager.handle_profile_status(&mut Session::new("s1", &mut store), &db);
        assert!(store.saves().is_empty());
    }

    #[test]
    fn test_normalize_custom_quest_statuses() {
        let mut ctx = context();
        let manager = manager(&mut ctx);
        let mut db = Database::default();
        db.templates = templates();

        let mut profile: PmcProfile = serde_json::from_value(json!({
            "Quests": [
                {
                    "qid": CUSTOM_QUEST, "startTime": 0, "status": 2,
                    "statusTimers": { "1": 100.0, "2": 200.0 },
                    "completedConditions": ["k1"]
                },
                { "qid": QUEST, "startTime": 0, "status": 2, "statusTimers": { "1": 1.0, "2": 2.0 } }
            ],
            "TaskConditionCounters": {
                "k1": { "id": "k1", "sourceId": "k1", "type": "Elimination", "value": 7 },
                "other": { "id": "other", "sourceId": "zz", "type": "Elimination", "value": 3 }
            }
        }))
        .unwrap();

        assert!(manager.normalize_custom_quest_statuses(&mut profile, &db));

        let quests = profile.quests.as_ref().unwrap();
        assert_eq!(quests[0].status, quest_state::AVAILABLE_FOR_START);
        assert!(quests[0].completed_conditions.is_empty());
        assert_eq!(quests[0].status_timers.len(), 1);
        assert_eq!(quests[0].timer(quest_state::AVAILABLE_FOR_START), Some(100.0));
        assert_eq!(quests[1].status, quest_state::STARTED);

        let counters = profile.task_condition_counters.as_ref().unwrap();
        assert_eq!(counters["k1"].value, 0.0);
        assert_eq!(counters["other"].value, 3.0);

        assert!(!manager.normalize_custom_quest_statuses(&mut profile, &db));
    }
}
