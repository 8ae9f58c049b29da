//! Quest synthesis and reward wiring.
//!
//! Two authored quest shapes are built from config: mastery quests (kill a
//! number of enemies, optionally with given weapons or against given enemy
//! types) and collector quests (hand over items). Existing quests can have
//! their rewards and finish conditions replaced by id.
//!
//! Assortment-unlock rewards requested by the traders pass are not attached
//! here; the orchestrator flushes the unlock queue after every manager ran.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::{Context, WeaponCatalog};
use crate::db::quest::{QuestCondition, QuestReward, RewardType, REWARD_FAIL, REWARD_STARTED, REWARD_SUCCESS};
use crate::db::{Database, Item, Locales, Quest};
use crate::ids;
use crate::locale::LocaleOverlay;
use crate::reference::{enemy_name, trader_by_code, ROUBLES};

pub const ELIMINATION: &str = "Elimination";
pub const HANDOVER_ITEM: &str = "HandoverItem";

const MASTERY_IMAGE: &str = "/files/quest/icon/5968ec2986f7741ddf17db83.png";
const COLLECTOR_IMAGE: &str = "/files/quest/icon/60c37450de6b0b44cc320e9a.jpg";

/// Quest status value for a completed quest
const STATUS_SUCCESS: i64 = 4;

/// Minimum level that effectively disables repeatable quests
const REPEATABLE_DISABLED_LEVEL: i64 = 100;

/// One finish requirement, either an elimination or an item handover
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinishRequirement {
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::int")]
    pub count: i64,
    #[serde(rename = "templateId", deserialize_with = "lenient::string")]
    pub target: String,
    #[serde(deserialize_with = "lenient::vec")]
    pub weapon_ids: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub weapon_categories: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub scav_types: Vec<String>,
    /// Extra line appended to the quest description
    #[serde(deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
}

impl FinishRequirement {
    pub fn handover(target: &str, count: i64) -> Self {
        FinishRequirement {
            kind: HANDOVER_ITEM.to_string(),
            target: target.to_string(),
            count,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewardConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub count: i64,
    #[serde(rename = "type", deserialize_with = "lenient::opt_string")]
    pub kind: Option<String>,
}

/// Changes to an existing quest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestOverride {
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_all_rewards: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub rewards: Option<Vec<RewardConfig>>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub requirements: Vec<FinishRequirement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MasteryQuestConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub trader_acr: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::int")]
    pub kills: i64,
    #[serde(deserialize_with = "lenient::vec")]
    pub weapon_ids: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub weapon_categories: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub scav_types: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub start_quest_requirements: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub rewards: Vec<RewardConfig>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_all_rewards: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorItem {
    #[serde(deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorQuestConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub trader_acr: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    /// A list, or an object whose values are the entries
    #[serde(deserialize_with = "lenient::vec_or_values")]
    pub requirements: Vec<CollectorItem>,
    #[serde(deserialize_with = "lenient::vec")]
    pub start_quest_requirements: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub rewards: Vec<RewardConfig>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_all_rewards: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_rewards: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub disable_repeatable_quests: bool,
    /// quest id → changes
    #[serde(deserialize_with = "lenient::map")]
    pub quests: IndexMap<String, QuestOverride>,
    /// quest title → definition
    #[serde(deserialize_with = "lenient::map")]
    pub mastery_quests: IndexMap<String, MasteryQuestConfig>,
    /// quest title → definition
    #[serde(deserialize_with = "lenient::map")]
    pub collector_quests: IndexMap<String, CollectorQuestConfig>,
}

/// Locale and weapon lookups used while writing quest text
pub struct QuestText<'a> {
    pub locale: &'a mut LocaleOverlay,
    pub locales: &'a mut Locales,
    pub weapons: &'a WeaponCatalog,
}

impl QuestText<'_> {
    fn set(&mut self, key: &str, value: &str) {
        self.locale.set_all(self.locales, key, value);
    }

    /// English item name, or the template id when it has none
    fn item_name(&mut self, tpl: &str) -> String {
        self.locale
            .try_get_en(self.locales, &format!("{tpl} Name"))
            .unwrap_or_else(|| tpl.to_string())
    }
}

#[derive(Debug, Default)]
pub struct QuestsManager {
    config: QuestsConfig,
}

impl QuestsManager {
    /// Replace a quest's finish conditions.
    ///
    /// Requirements of an unknown kind are skipped. Each kept requirement
    /// gets a condition locale string; with `set_description` the quest
    /// description becomes `description` followed by one line per
    /// requirement.
    pub fn set_finish_reqs(
        quest: &mut Quest,
        description: &str,
        requirements: &[FinishRequirement],
        set_description: bool,
        text: &mut QuestText<'_>,
    ) {
        quest.conditions.available_for_finish.clear();
        if requirements.is_empty() {
            return;
        }

        let mut description = description.to_string();
        let mut index = 0;
        for requirement in requirements {
            let req_id = ids::sha24(&format!("{}req{index}", quest.id));

            if let Some(extra) = requirement.description.as_deref().filter(|d| !d.trim().is_empty()) {
                description.push_str(extra);
                description.push('\n');
            }

            let (condition, locale_text) = if requirement.kind.eq_ignore_ascii_case(ELIMINATION) {
                elimination_condition(&req_id, requirement, index, &mut description, text.weapons)
            } else if requirement.kind.eq_ignore_ascii_case(HANDOVER_ITEM) {
                handover_condition(&req_id, requirement, index, &mut description, text)
            } else {
                continue;
            };

            quest.conditions.available_for_finish.push(condition);
            if !locale_text.trim().is_empty() {
                text.set(&req_id, &locale_text);
            }
            index += 1;
        }

        if set_description {
            let key = quest
                .locale_key("description")
                .map_or_else(|| format!("{} description", quest.id), str::to_string);
            text.set(&key, &description);
        }
    }

    /// Append configured rewards to the Success bucket, optionally clearing it first
    pub fn set_rewards(quest: &mut Quest, rewards: &[RewardConfig], clear: bool) {
        let mut index = quest.next_reward_index(REWARD_SUCCESS);
        let success = quest.rewards.entry(REWARD_SUCCESS.to_string()).or_default();
        if clear {
            success.clear();
            index = 0;
        }

        for config in rewards {
            let item_id = ids::sha24(&format!("{}reward{index}target", quest.id));
            let kind = config
                .kind
                .as_deref()
                .and_then(RewardType::parse)
                .unwrap_or(RewardType::Item);

            let mut reward = QuestReward::new(ids::sha24(&format!("{}reward{index}", quest.id)), kind, index)
                .with("availableInGameEditions", json!([]))
                .with("gameMode", json!(["regular", "pve"]))
                .with("isHidden", Value::Bool(false))
                .with("isEncoded", Value::Bool(false))
                .with("unknown", Value::Bool(false))
                .with("findInRaid", Value::Bool(false));
            reward.value = Some(json!(config.count));
            reward.target = Some(item_id.clone());

            let mut items = Vec::new();
            if ids::is_valid(&config.template_id) {
                items.push(Item::new(item_id, config.template_id.clone()).with_stack(config.count));
            }
            reward.items = Some(items);

            success.push(reward);
            index += 1;
        }
    }

    fn apply_overrides(&self, db_quests: &mut IndexMap<String, Quest>, text: &mut QuestText<'_>) {
        for (quest_id, changes) in &self.config.quests {
            if !ids::is_valid(quest_id) {
                continue;
            }
            let Some(quest) = find_quest(db_quests, quest_id) else {
                continue;
            };

            if changes.clear_all_rewards || changes.rewards.is_some() {
                Self::set_rewards(quest, changes.rewards.as_deref().unwrap_or_default(), changes.clear_all_rewards);
            }

            let description = changes.description.clone().unwrap_or_default();
            if !changes.requirements.is_empty() {
                Self::set_finish_reqs(quest, &description, &changes.requirements, true, text);
            } else if changes.description.is_some() {
                if let Some(key) = quest.locale_key("description").map(str::to_string) {
                    text.set(&key, &description);
                }
            }
        }
    }
}

impl ContentManager for QuestsManager {
    fn name(&self) -> &'static str {
        "Quests"
    }

    fn config_name(&self) -> &'static str {
        "QuestsConfig"
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

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let Database { templates, locales, .. } = db;
        let Context { locale, weapons, debug, .. } = ctx;
        let debug = &*debug;
        let mut text = QuestText { locale, locales, weapons };
        let quests = &mut templates.quests;

        if self.config.remove_rewards {
            remove_default_rewards(quests);
        }

        self.apply_overrides(quests, &mut text);

        let mut added = 0;
        for (title, config) in &self.config.mastery_quests {
            let Some(mut quest) = new_quest(quests, &config.id, &config.trader_acr, ELIMINATION, MASTERY_IMAGE, title) else {
                continue;
            };
            set_locale_defaults(&mut text, &config.id, title, &config.description);
            if !debug.no_new_quests_start_requirements {
                set_start_reqs(&mut quest, &config.start_quest_requirements);
                ensure_start_condition(&mut quest);
            }

            let requirement = FinishRequirement {
                kind: ELIMINATION.to_string(),
                count: config.kills,
                weapon_ids: config.weapon_ids.clone(),
                weapon_categories: config.weapon_categories.clone(),
                scav_types: config.scav_types.clone(),
                ..Default::default()
            };
            Self::set_finish_reqs(&mut quest, &config.description, &[requirement], true, &mut text);
            Self::set_rewards(&mut quest, &config.rewards, config.clear_all_rewards);

            quests.insert(config.id.clone(), quest);
            added += 1;
        }

        for (title, config) in &self.config.collector_quests {
            let Some(mut quest) = new_quest(quests, &config.id, &config.trader_acr, "PickUp", COLLECTOR_IMAGE, title) else {
                continue;
            };
            set_locale_defaults(&mut text, &config.id, title, &config.description);
            if !debug.no_new_quests_start_requirements {
                set_start_reqs(&mut quest, &config.start_quest_requirements);
                ensure_start_condition(&mut quest);
            }

            let requirements: Vec<FinishRequirement> = config
                .requirements
                .iter()
                .map(|r| FinishRequirement::handover(&r.template_id, r.count))
                .collect();
            Self::set_finish_reqs(&mut quest, &config.description, &requirements, true, &mut text);
            Self::set_rewards(&mut quest, &config.rewards, config.clear_all_rewards);

            quests.insert(config.id.clone(), quest);
            added += 1;
        }

        if debug.easy_quests {
            let trivial = [FinishRequirement::handover(ROUBLES, 1)];
            for quest in quests.values_mut() {
                Self::set_finish_reqs(quest, "", &trivial, true, &mut text);
            }
        }

        text.locale.sync_quest_locales(text.locales, quests.values());

        if debug.print_quest_count {
            info!("Quest changes applied! ({added} quests added)");
        } else {
            info!("Quest changes applied!");
        }
    }

    fn post_startup(&mut self, db: &mut Database, _ctx: &mut Context) {
        if self.config.disable_repeatable_quests {
            for rule in &mut db.server.quest.repeatable_quests {
                rule.min_player_level = REPEATABLE_DISABLED_LEVEL;
            }
        }
    }
}

// Internal helper functions

fn find_quest<'a>(quests: &'a mut IndexMap<String, Quest>, id: &str) -> Option<&'a mut Quest> {
    if quests.contains_key(id) {
        return quests.get_mut(id);
    }
    quests.get_mut(&id.to_ascii_lowercase())
}

fn remove_default_rewards(quests: &mut IndexMap<String, Quest>) {
    for quest in quests.values_mut() {
        if let Some(success) = quest.rewards.get_mut(REWARD_SUCCESS) {
            success.retain(|r| {
                !(r.is(RewardType::Item) || r.is(RewardType::ProductionScheme) || r.is(RewardType::AssortmentUnlock))
            });
        }
    }
}

/// A blank quest, or `None` when the id is unusable or taken
fn new_quest(
    quests: &IndexMap<String, Quest>,
    id: &str,
    trader_code: &str,
    kind: &str,
    image: &str,
    title: &str,
) -> Option<Quest> {
    if id.trim().is_empty() {
        return None;
    }
    if !ids::is_valid(id) {
        error!(quest = %id, "invalid quest id");
        return None;
    }
    if quests.contains_key(id) || quests.contains_key(&id.to_ascii_lowercase()) {
        error!(quest = %id, "Quest with id already exists");
        return None;
    }

    let mut extra = Map::new();
    let mut put = |key: &str, value: Value| {
        extra.insert(key.to_string(), value);
    };
    put("traderId", json!(trader_by_code(trader_code).unwrap_or_default()));
    put("type", json!(kind));
    put("canShowNotificationsInGame", json!(true));
    put("restartable", json!(false));
    put("instantComplete", json!(false));
    put("isKey", json!(false));
    put("secretQuest", json!(false));
    put("status", json!(0));
    put("image", json!(image));
    put("location", json!("any"));
    put("side", json!("Pmc"));
    put("progressSource", json!("eft"));
    put("acceptanceAndFinishingSource", json!("eft"));
    put("rankingModes", json!([]));
    put("gameModes", json!([]));
    put("arenaLocations", json!([]));
    for field in crate::locale::QUEST_LOCALE_FIELDS {
        put(field, json!(format!("{id} {field}")));
    }

    let mut rewards = IndexMap::new();
    for bucket in [REWARD_STARTED, REWARD_SUCCESS, REWARD_FAIL] {
        rewards.insert(bucket.to_string(), Vec::new());
    }

    Some(Quest {
        id: id.to_string(),
        quest_name: Some(title.to_string()),
        conditions: Default::default(),
        rewards,
        extra,
    })
}

fn set_locale_defaults(text: &mut QuestText<'_>, id: &str, title: &str, description: &str) {
    text.set(&format!("{id} name"), title);
    text.set(&format!("{id} description"), description);
    text.set(&format!("{id} note"), "");
    for (field, verb) in [
        ("startedMessageText", "Started"),
        ("acceptPlayerMessage", "Accepted"),
        ("declinePlayerMessage", "Declined"),
        ("successMessageText", "Succeeded"),
        ("failMessageText", "Failed"),
        ("changeQuestMessageText", "Changed"),
        ("completePlayerMessage", "Completed"),
    ] {
        text.set(&format!("{id} {field}"), &format!("{verb} {title}"));
    }
}

/// Gate the quest behind the completion of other quests
fn set_start_reqs(quest: &mut Quest, required: &[String]) {
    if required.is_empty() {
        return;
    }
    let start = &mut quest.conditions.available_for_start;
    start.clear();

    let mut index = 0;
    for required_id in required.iter().filter(|r| !r.trim().is_empty()) {
        let id = ids::sha24(&format!("{}AFS{index}", quest.id));
        start.push(
            QuestCondition::new(id, "Quest", index)
                .with("availableAfter", json!(0))
                .with("dispersion", json!(0))
                .with("globalQuestCounterId", json!(""))
                .with("dynamicLocale", json!(false))
                .with("parentId", json!(""))
                .with("status", json!([STATUS_SUCCESS]))
                .with("target", json!(required_id))
                .with("visibilityConditions", json!([])),
        );
        index += 1;
    }
}

/// Every authored quest needs at least a level 1 start condition
fn ensure_start_condition(quest: &mut Quest) {
    if !quest.conditions.available_for_start.is_empty() {
        return;
    }
    let id = ids::sha24(&format!("{}AFSLevel", quest.id));
    quest.conditions.available_for_start.push(
        QuestCondition::new(id, "Level", 0)
            .with("compareMethod", json!(">="))
            .with("dynamicLocale", json!(false))
            .with("globalQuestCounterId", json!(""))
            .with("parentId", json!(""))
            .with("value", json!(1))
            .with("visibilityConditions", json!([])),
    );
}

fn elimination_condition(
    req_id: &str,
    requirement: &FinishRequirement,
    index: i64,
    description: &mut String,
    weapons: &WeaponCatalog,
) -> (QuestCondition, String) {
    let mut locale_text = String::new();

    let roles: Vec<&str> = requirement
        .scav_types
        .iter()
        .map(String::as_str)
        .filter(|r| !r.trim().is_empty())
        .collect();
    if !roles.is_empty() {
        let names: Vec<String> = roles.iter().map(|r| enemy_name(r)).collect();
        locale_text = format!("Kill {}", names.join(", "));
        description.push_str(&locale_text);
        description.push('\n');
    }

    let mut weapon_ids: Vec<String> = Vec::new();
    let explicit: Vec<&String> = requirement.weapon_ids.iter().filter(|w| !w.trim().is_empty()).collect();
    if !explicit.is_empty() {
        let names: Vec<String> = explicit.iter().map(|w| weapons.description(w)).collect();
        description.push_str(&format!("Kill with any of: {}\n", names.join(", ")));
        weapon_ids = explicit.into_iter().cloned().collect();
    } else if !requirement.weapon_categories.is_empty() {
        let found: Vec<(String, String)> = requirement
            .weapon_categories
            .iter()
            .filter(|c| !c.trim().is_empty())
            .flat_map(|c| weapons.category_ids(c))
            .collect();
        let names: Vec<&str> = found.iter().map(|(_, desc)| desc.as_str()).collect();
        description.push_str(&format!("Kill with any of: {}\n", names.join(", ")));
        weapon_ids = found.into_iter().map(|(id, _)| id).collect();
    }
    weapon_ids.dedup();

    if locale_text.trim().is_empty() {
        locale_text = "Kill any".to_string();
    }

    let kills = json!({
        "id": ids::sha24(&format!("{req_id}_condition")),
        "dynamicLocale": false,
        "compareMethod": ">=",
        "target": "Any",
        "value": 1,
        "conditionType": "Kills",
        "bodyPart": [],
        "daytime": { "from": 0, "to": 0 },
        "distance": { "compareMethod": ">=", "value": 0 },
        "enemyEquipmentExclusive": [],
        "enemyEquipmentInclusive": [],
        "enemyHealthEffects": [],
        "resetOnSessionEnd": false,
        "savageRole": roles,
        "weapon": weapon_ids,
        "weaponCaliber": [],
        "weaponModsExclusive": [],
        "weaponModsInclusive": []
    });

    let condition = QuestCondition::new(req_id, "CounterCreator", index)
        .with("type", json!(ELIMINATION))
        .with("value", json!(requirement.count))
        .with("completeInSeconds", json!(0))
        .with("doNotResetIfCounterCompleted", json!(false))
        .with("dynamicLocale", json!(false))
        .with("globalQuestCounterId", json!(""))
        .with("oneSessionOnly", json!(false))
        .with("parentId", json!(""))
        .with("visibilityConditions", json!([]))
        .with(
            "counter",
            json!({ "id": ids::sha24(&format!("{req_id}_counter")), "conditions": [kills] }),
        );

    (condition, locale_text)
}

fn handover_condition(
    req_id: &str,
    requirement: &FinishRequirement,
    index: i64,
    description: &mut String,
    text: &mut QuestText<'_>,
) -> (QuestCondition, String) {
    let name = text.item_name(&requirement.target);
    description.push_str(&format!("Find {} {name}\n", requirement.count));
    let locale_text = format!("Handover {} {name}", requirement.count);

    let condition = QuestCondition::new(req_id, HANDOVER_ITEM, index)
        .with("maxDurability", json!(100))
        .with("minDurability", json!(0))
        .with("dogtagLevel", json!(0))
        .with("value", json!(requirement.count))
        .with("onlyFoundInRaid", json!(false))
        .with("target", json!([requirement.target]))
        .with("dynamicLocale", json!(false))
        .with("isEncoded", json!(false))
        .with("globalQuestCounterId", json!(""))
        .with("parentId", json!(""))
        .with("visibilityConditions", json!([]));

    (condition, locale_text)
}
