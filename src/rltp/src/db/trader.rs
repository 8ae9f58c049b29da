//! Trader records and assortments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::item::Item;
use crate::config::lenient;

/// Quest outcome buckets of a trader's quest-lock map.
pub const QUEST_ASSORT_STATES: [&str; 3] = ["started", "success", "fail"];

/// Quest-lock map: outcome state → assort item id → quest id.
pub type QuestAssort = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    pub base: TraderBase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assort: Option<TraderAssort>,

    #[serde(rename = "questassort", default, skip_serializing_if = "Option::is_none")]
    pub quest_assort: Option<QuestAssort>,
}

impl Trader {
    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn nickname(&self) -> &str {
        self.base.nickname.as_deref().unwrap_or(&self.base.id)
    }

    pub fn assort_mut(&mut self) -> &mut TraderAssort {
        self.assort.get_or_insert_with(TraderAssort::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderBase {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Insurance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_buy: Option<ItemsBuy>,

    #[serde(rename = "nextResupply", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub next_resupply: Option<i64>,

    #[serde(rename = "unlockedByDefault", default, skip_serializing_if = "Option::is_none")]
    pub unlocked_by_default: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medic: Option<bool>,

    #[serde(rename = "loyaltyLevels", default, skip_serializing_if = "Vec::is_empty")]
    pub loyalty_levels: Vec<LoyaltyLevel>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default)]
    pub availability: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsBuy {
    #[serde(default)]
    pub category: Vec<String>,

    #[serde(default)]
    pub id_list: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyLevel {
    #[serde(rename = "minSalesSum", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub min_sales_sum: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderAssort {
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub barter_scheme: IndexMap<String, Vec<Vec<BarterScheme>>>,

    #[serde(default)]
    pub loyal_level_items: IndexMap<String, i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TraderAssort {
    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id.eq_ignore_ascii_case(id))
    }

    /// The first root listing (parent "hideout") of a template
    pub fn find_root_by_tpl(&self, tpl: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|i| i.parent_is("hideout") && i.tpl.eq_ignore_ascii_case(tpl))
    }
}

/// One payment line of a barter basket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarterScheme {
    #[serde(rename = "_tpl")]
    pub tpl: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub count: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BarterScheme {
    pub fn new(tpl: impl Into<String>, count: f64) -> Self {
        BarterScheme {
            tpl: tpl.into(),
            count,
            ..Default::default()
        }
    }
}
