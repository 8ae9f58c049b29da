//! Player profiles and profile templates.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::item::Item;
use crate::config::lenient;

/// A live PMC character (or the character part of a profile template).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PmcProfile {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(rename = "Info", default)]
    pub info: ProfileInfo,

    #[serde(rename = "Inventory", default)]
    pub inventory: Inventory,

    #[serde(rename = "Health", default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,

    #[serde(rename = "Hideout", default, skip_serializing_if = "Option::is_none")]
    pub hideout: Option<ProfileHideout>,

    #[serde(rename = "Skills", default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,

    #[serde(rename = "Quests", default, skip_serializing_if = "Option::is_none")]
    pub quests: Option<Vec<QuestStatus>>,

    #[serde(rename = "TaskConditionCounters", default, skip_serializing_if = "Option::is_none")]
    pub task_condition_counters: Option<IndexMap<String, TaskConditionCounter>>,

    #[serde(rename = "Bonuses", default, skip_serializing_if = "Option::is_none")]
    pub bonuses: Option<Vec<Bonus>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PmcProfile {
    pub fn game_version(&self) -> Option<&str> {
        self.info.game_version.as_deref()
    }

    pub fn stash_id(&self) -> Option<&str> {
        self.inventory.stash.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    #[serde(rename = "Nickname", default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(rename = "GameVersion", default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,

    #[serde(rename = "Side", default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash: Option<String>,

    #[serde(rename = "sortingTable", default, skip_serializing_if = "Option::is_none")]
    pub sorting_table: Option<String>,

    #[serde(rename = "questRaidItems", default, skip_serializing_if = "Option::is_none")]
    pub quest_raid_items: Option<String>,

    #[serde(rename = "questStashItems", default, skip_serializing_if = "Option::is_none")]
    pub quest_stash_items: Option<String>,

    #[serde(rename = "hideoutAreaStashes", default, skip_serializing_if = "IndexMap::is_empty")]
    pub hideout_area_stashes: IndexMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Inventory {
    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id.eq_ignore_ascii_case(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id.eq_ignore_ascii_case(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(rename = "BodyParts", default)]
    pub body_parts: IndexMap<String, BodyPart>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyPart {
    #[serde(rename = "Health", default)]
    pub health: CurrentMax,

    #[serde(rename = "Effects", default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentMax {
    #[serde(rename = "Current", default, deserialize_with = "lenient::number")]
    pub current: f64,

    #[serde(rename = "Maximum", default, deserialize_with = "lenient::number")]
    pub maximum: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileHideout {
    #[serde(rename = "Areas", default)]
    pub areas: Vec<AreaState>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaState {
    #[serde(rename = "type", default, deserialize_with = "lenient::int")]
    pub area_type: i64,

    #[serde(default, deserialize_with = "lenient::int")]
    pub level: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(rename = "Common", default)]
    pub common: Vec<CommonSkill>,

    #[serde(rename = "Mastering", default)]
    pub mastering: Vec<Value>,

    #[serde(rename = "Points", default, deserialize_with = "lenient::number")]
    pub points: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonSkill {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(rename = "Progress", default, deserialize_with = "lenient::number")]
    pub progress: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Quest progress states, as the host numbers them.
pub mod quest_state {
    pub const LOCKED: i64 = 0;
    pub const AVAILABLE_FOR_START: i64 = 1;
    pub const STARTED: i64 = 2;
    pub const AVAILABLE_FOR_FINISH: i64 = 3;
    pub const SUCCESS: i64 = 4;
    pub const FAIL: i64 = 5;

    const NAMES: [&str; 10] = [
        "Locked",
        "AvailableForStart",
        "Started",
        "AvailableForFinish",
        "Success",
        "Fail",
        "FailRestartable",
        "MarkedAsFailed",
        "Expired",
        "AvailableAfter",
    ];

    /// Resolve a state given by number or by name
    pub fn parse(key: &str) -> Option<i64> {
        key.parse::<i64>().ok().or_else(|| {
            NAMES
                .iter()
                .position(|n| n.eq_ignore_ascii_case(key))
                .map(|p| p as i64)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestStatus {
    pub qid: String,

    #[serde(rename = "startTime", default, deserialize_with = "lenient::number")]
    pub start_time: f64,

    #[serde(default, deserialize_with = "quest_status")]
    pub status: i64,

    #[serde(rename = "statusTimers", default)]
    pub status_timers: IndexMap<String, f64>,

    #[serde(rename = "completedConditions", default)]
    pub completed_conditions: Vec<String>,

    #[serde(rename = "availableAfter", default, deserialize_with = "lenient::number")]
    pub available_after: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestStatus {
    /// Timer recorded for a state, whether keyed by number or by name
    pub fn timer(&self, state: i64) -> Option<f64> {
        self.status_timers
            .iter()
            .find(|(k, _)| quest_state::parse(k) == Some(state))
            .map(|(_, v)| *v)
    }
}

fn quest_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => quest_state::parse(&name).unwrap_or(quest_state::LOCKED),
        other => lenient::as_int(&other).unwrap_or(quest_state::LOCKED),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConditionCounter {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "sourceId", default)]
    pub source_id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A selectable starting profile: one template per side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bear: Option<ProfileSide>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usec: Option<ProfileSide>,

    #[serde(rename = "descriptionLocaleKey", default)]
    pub description_locale_key: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<PmcProfile>,

    #[serde(default)]
    pub trader: ProfileTraderSettings,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTraderSettings {
    #[serde(rename = "initialLoyaltyLevel", default)]
    pub initial_loyalty_level: IndexMap<String, i64>,

    #[serde(rename = "initialStanding", default)]
    pub initial_standing: IndexMap<String, Option<f64>>,

    #[serde(rename = "initialSalesSum", default, deserialize_with = "lenient::number")]
    pub initial_sales_sum: f64,

    #[serde(rename = "jaegerUnlocked", default)]
    pub jaeger_unlocked: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quest_status_by_name_or_number() {
        let a: QuestStatus =
            serde_json::from_value(json!({ "qid": "q", "status": "Started" })).unwrap();
        let b: QuestStatus = serde_json::from_value(json!({ "qid": "q", "status": 2 })).unwrap();
        assert_eq!(a.status, quest_state::STARTED);
        assert_eq!(b.status, quest_state::STARTED);
    }

    #[test]
    fn test_timer_lookup() {
        let status: QuestStatus = serde_json::from_value(json!({
            "qid": "q",
            "statusTimers": { "1": 100.0, "Started": 200.0 }
        }))
        .unwrap();
        assert_eq!(status.timer(quest_state::AVAILABLE_FOR_START), Some(100.0));
        assert_eq!(status.timer(quest_state::STARTED), Some(200.0));
        assert_eq!(status.timer(quest_state::SUCCESS), None);
    }

    #[test]
    fn test_profile_accessors() {
        let profile: PmcProfile = serde_json::from_value(json!({
            "_id": "pmc",
            "Info": { "Nickname": "Nik", "GameVersion": "VAI Rogue-lite" },
            "Inventory": { "items": [{ "_id": "s", "_tpl": "t" }], "stash": "s" }
        }))
        .unwrap();
        assert_eq!(profile.game_version(), Some("VAI Rogue-lite"));
        assert_eq!(profile.stash_id(), Some("s"));
        assert!(profile.inventory.find("S").is_some());
        assert!(profile.quests.is_none());
    }
}
