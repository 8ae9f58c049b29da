//! Item templates: the catalog every instance points into.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_name", default)]
    pub name: String,

    #[serde(rename = "_parent", default)]
    pub parent: String,

    #[serde(rename = "_type", default)]
    pub kind: String,

    #[serde(rename = "_props", default)]
    pub props: TemplateProps,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemTemplate {
    pub fn slots(&self) -> &[Slot] {
        self.props.slots.as_deref().unwrap_or_default()
    }

    pub fn width(&self) -> i64 {
        self.props.width.unwrap_or(1)
    }

    pub fn height(&self) -> i64 {
        self.props.height.unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateProps {
    #[serde(rename = "Width", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,

    #[serde(rename = "Height", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,

    #[serde(rename = "StackMaxSize", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub stack_max_size: Option<i64>,

    #[serde(rename = "Slots", default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<Slot>>,

    #[serde(rename = "Chambers", default, skip_serializing_if = "Option::is_none")]
    pub chambers: Option<Vec<Slot>>,

    #[serde(rename = "Cartridges", default, skip_serializing_if = "Option::is_none")]
    pub cartridges: Option<Vec<Slot>>,

    #[serde(rename = "Grids", default, skip_serializing_if = "Option::is_none")]
    pub grids: Option<Vec<Grid>>,

    #[serde(rename = "BackgroundColor", default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(rename = "StimulatorBuffs", default, skip_serializing_if = "Option::is_none")]
    pub stimulator_buffs: Option<String>,

    #[serde(rename = "RecoilForceBack", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub recoil_force_back: Option<f64>,

    #[serde(rename = "RecoilForceUp", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub recoil_force_up: Option<f64>,

    #[serde(rename = "RecoilCamera", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub recoil_camera: Option<f64>,

    #[serde(rename = "Unlootable", default, skip_serializing_if = "Option::is_none")]
    pub unlootable: Option<bool>,

    #[serde(rename = "UnlootableFromSlot", default, skip_serializing_if = "Option::is_none")]
    pub unlootable_from_slot: Option<String>,

    #[serde(rename = "UnlootableFromSide", default, skip_serializing_if = "Option::is_none")]
    pub unlootable_from_side: Option<Vec<String>>,

    #[serde(rename = "CanSellOnRagfair", default, skip_serializing_if = "Option::is_none")]
    pub can_sell_on_ragfair: Option<bool>,

    #[serde(rename = "CanRequireOnRagfair", default, skip_serializing_if = "Option::is_none")]
    pub can_require_on_ragfair: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named attachment point with an allow-list of child templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "_name", default)]
    pub name: String,

    #[serde(rename = "_props", default)]
    pub props: SlotProps,

    #[serde(rename = "_max_count", default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub max_count: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slot {
    /// Add a template to every filter of this slot, skipping filters that already allow it
    pub fn allow(&mut self, tpl: &str) {
        for filter in &mut self.props.filters {
            if !filter.filter.iter().any(|f| f == tpl) {
                filter.filter.push(tpl.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotProps {
    #[serde(default)]
    pub filters: Vec<SlotFilter>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotFilter {
    #[serde(rename = "Filter", default)]
    pub filter: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A rectangular storage region of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    #[serde(rename = "_name", default)]
    pub name: String,

    #[serde(rename = "_props", default)]
    pub props: GridProps,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridProps {
    #[serde(rename = "cellsH", default, deserialize_with = "lenient::int")]
    pub cells_h: i64,

    #[serde(rename = "cellsV", default, deserialize_with = "lenient::int")]
    pub cells_v: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_defaults() {
        let tpl: ItemTemplate = serde_json::from_value(json!({
            "_id": "5485a8684bdc2da71d8b4567",
            "_props": { "Weight": 0.1 }
        }))
        .unwrap();
        assert_eq!(tpl.width(), 1);
        assert_eq!(tpl.height(), 1);
        assert!(tpl.slots().is_empty());
        assert_eq!(tpl.props.extra["Weight"], json!(0.1));
    }

    #[test]
    fn test_slot_allow_is_idempotent() {
        let mut slot: Slot = serde_json::from_value(json!({
            "_name": "mod_launcher",
            "_props": { "filters": [{ "Filter": ["a"] }, { "Filter": [] }] }
        }))
        .unwrap();
        slot.allow("b");
        slot.allow("b");
        slot.allow("a");
        assert_eq!(slot.props.filters[0].filter, vec!["a", "b"]);
        assert_eq!(slot.props.filters[1].filter, vec!["b", "a"]);
    }
}
