//! Quest templates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::item::Item;
use crate::config::lenient;

/// Reward outcome buckets.
pub const REWARD_STARTED: &str = "Started";
pub const REWARD_SUCCESS: &str = "Success";
pub const REWARD_FAIL: &str = "Fail";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "QuestName", default, skip_serializing_if = "Option::is_none")]
    pub quest_name: Option<String>,

    #[serde(default)]
    pub conditions: QuestConditions,

    #[serde(default)]
    pub rewards: IndexMap<String, Vec<QuestReward>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Quest {
    /// Next free reward index of a bucket: one past the current maximum
    pub fn next_reward_index(&self, bucket: &str) -> i64 {
        self.rewards
            .get(bucket)
            .and_then(|list| list.iter().map(|r| r.index).max())
            .map_or(0, |max| max + 1)
    }

    /// Locale key stored in a text field such as `name` or `description`
    pub fn locale_key(&self, field: &str) -> Option<&str> {
        self.extra
            .get(field)
            .and_then(Value::as_str)
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestConditions {
    #[serde(rename = "AvailableForFinish", default)]
    pub available_for_finish: Vec<QuestCondition>,

    #[serde(rename = "AvailableForStart", default)]
    pub available_for_start: Vec<QuestCondition>,

    #[serde(rename = "Fail", default)]
    pub fail: Vec<QuestCondition>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single start, finish or fail condition.
///
/// Only the fields the pipeline keys on are typed; the rest of the
/// condition payload rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestCondition {
    pub id: String,

    #[serde(rename = "conditionType", default)]
    pub condition_type: String,

    #[serde(default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestCondition {
    pub fn new(id: impl Into<String>, condition_type: &str, index: i64) -> Self {
        QuestCondition {
            id: id.into(),
            condition_type: condition_type.to_string(),
            index: Some(index),
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestReward {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, deserialize_with = "lenient::int")]
    pub index: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestReward {
    pub fn new(id: impl Into<String>, kind: RewardType, index: i64) -> Self {
        QuestReward {
            id: id.into(),
            kind: kind.as_str().to_string(),
            index,
            ..Default::default()
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is(&self, kind: RewardType) -> bool {
        self.kind.eq_ignore_ascii_case(kind.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardType {
    Skill,
    Experience,
    TraderStanding,
    TraderUnlock,
    Item,
    AssortmentUnlock,
    ProductionScheme,
    TraderStandingReset,
    TraderStandingRestore,
    StashRows,
    Achievement,
    Pockets,
    CustomizationDirect,
    CustomizationOffer,
    ExtraDailyQuest,
    NotificationPopup,
    WebPromoCode,
}

impl RewardType {
    pub const ALL: [RewardType; 17] = [
        RewardType::Skill,
        RewardType::Experience,
        RewardType::TraderStanding,
        RewardType::TraderUnlock,
        RewardType::Item,
        RewardType::AssortmentUnlock,
        RewardType::ProductionScheme,
        RewardType::TraderStandingReset,
        RewardType::TraderStandingRestore,
        RewardType::StashRows,
        RewardType::Achievement,
        RewardType::Pockets,
        RewardType::CustomizationDirect,
        RewardType::CustomizationOffer,
        RewardType::ExtraDailyQuest,
        RewardType::NotificationPopup,
        RewardType::WebPromoCode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RewardType::Skill => "Skill",
            RewardType::Experience => "Experience",
            RewardType::TraderStanding => "TraderStanding",
            RewardType::TraderUnlock => "TraderUnlock",
            RewardType::Item => "Item",
            RewardType::AssortmentUnlock => "AssortmentUnlock",
            RewardType::ProductionScheme => "ProductionScheme",
            RewardType::TraderStandingReset => "TraderStandingReset",
            RewardType::TraderStandingRestore => "TraderStandingRestore",
            RewardType::StashRows => "StashRows",
            RewardType::Achievement => "Achievement",
            RewardType::Pockets => "Pockets",
            RewardType::CustomizationDirect => "CustomizationDirect",
            RewardType::CustomizationOffer => "CustomizationOffer",
            RewardType::ExtraDailyQuest => "ExtraDailyQuest",
            RewardType::NotificationPopup => "NotificationPopup",
            RewardType::WebPromoCode => "WebPromoCode",
        }
    }

    /// Case-insensitive parse by name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}
