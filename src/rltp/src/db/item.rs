//! Inventory item instances.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::lenient;

/// A concrete item instance inside an inventory, an assortment or a preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_tpl")]
    pub tpl: String,

    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(rename = "slotId", default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ItemLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<Upd>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, tpl: impl Into<String>) -> Self {
        Item {
            id: id.into(),
            tpl: tpl.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self.slot_id = Some(slot_id.into());
        self
    }

    pub fn with_stack(mut self, count: i64) -> Self {
        self.set_stack_count(count);
        self
    }

    pub fn parent_is(&self, id: &str) -> bool {
        self.parent_id
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(id))
    }

    pub fn slot_is(&self, slot: &str) -> bool {
        self.slot_id
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(slot))
    }

    pub fn stack_count(&self) -> Option<i64> {
        self.upd.as_ref().and_then(|u| u.stack_objects_count)
    }

    /// Set the stack count, creating the upd blob if needed
    pub fn set_stack_count(&mut self, count: i64) {
        self.upd.get_or_insert_with(Upd::default).stack_objects_count = Some(count);
    }
}

/// Mutable per-instance state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upd {
    #[serde(
        rename = "StackObjectsCount",
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub stack_objects_count: Option<i64>,

    #[serde(rename = "UnlimitedCount", default, skip_serializing_if = "Option::is_none")]
    pub unlimited_count: Option<bool>,

    #[serde(
        rename = "BuyRestrictionMax",
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub buy_restriction_max: Option<i64>,

    #[serde(
        rename = "BuyRestrictionCurrent",
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub buy_restriction_current: Option<i64>,

    #[serde(rename = "Repairable", default, skip_serializing_if = "Option::is_none")]
    pub repairable: Option<Repairable>,

    #[serde(rename = "SpawnedInSession", default, skip_serializing_if = "Option::is_none")]
    pub spawned_in_session: Option<bool>,

    #[serde(rename = "sptPresetId", default, skip_serializing_if = "Option::is_none")]
    pub spt_preset_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Repairable {
    #[serde(rename = "Durability", default)]
    pub durability: f64,

    #[serde(rename = "MaxDurability", default)]
    pub max_durability: f64,
}

/// Where an item sits inside its parent.
///
/// Grid containers use a cell position; cartridges inside a magazine use a
/// plain index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemLocation {
    Grid(GridLocation),
    Index(i64),
}

impl ItemLocation {
    pub fn grid(&self) -> Option<&GridLocation> {
        match self {
            ItemLocation::Grid(g) => Some(g),
            ItemLocation::Index(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLocation {
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub r: Rotation,
    #[serde(rename = "isSearched", default, skip_serializing_if = "Option::is_none")]
    pub is_searched: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Horizontal,
    Vertical,
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Rotation::Horizontal => "Horizontal",
            Rotation::Vertical => "Vertical",
        })
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Profiles carry either the enum name or its ordinal
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if s.eq_ignore_ascii_case("vertical") => Rotation::Vertical,
            Value::Number(n) if n.as_i64() == Some(1) => Rotation::Vertical,
            _ => Rotation::Horizontal,
        })
    }
}
