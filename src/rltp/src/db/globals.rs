//! Global game settings, the preset catalog and host server settings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::item::Item;
use crate::config::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    /// Raw settings tree; edited by dotted path.
    #[serde(default)]
    pub config: Value,

    #[serde(rename = "ItemPresets", default)]
    pub item_presets: IndexMap<String, ItemPreset>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A catalog preset entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPreset {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_type", default)]
    pub kind: String,

    #[serde(rename = "_changeWeaponName", default)]
    pub change_weapon_name: bool,

    #[serde(rename = "_name", default)]
    pub name: String,

    #[serde(rename = "_parent", default)]
    pub parent: String,

    #[serde(rename = "_items", default)]
    pub items: Vec<Item>,

    #[serde(rename = "_encyclopedia", default, skip_serializing_if = "Option::is_none")]
    pub encyclopedia: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Host settings the pipeline touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfigs {
    #[serde(default)]
    pub item: ItemServerConfig,

    #[serde(default)]
    pub quest: QuestServerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemServerConfig {
    #[serde(rename = "handbookPriceOverride", default)]
    pub handbook_price_override: IndexMap<String, HandbookPriceOverride>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandbookPriceOverride {
    #[serde(rename = "Price", default, deserialize_with = "lenient::number")]
    pub price: f64,

    #[serde(rename = "ParentId", default)]
    pub parent_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestServerConfig {
    #[serde(rename = "repeatableQuests", default)]
    pub repeatable_quests: Vec<RepeatableQuestConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatableQuestConfig {
    #[serde(rename = "minPlayerLevel", default, deserialize_with = "lenient::int")]
    pub min_player_level: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
