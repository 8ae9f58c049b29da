//! Hideout areas and production recipes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hideout {
    #[serde(default)]
    pub areas: Vec<HideoutArea>,

    #[serde(default)]
    pub production: HideoutProduction,
}

impl Hideout {
    pub fn area_mut(&mut self, area_type: i64) -> Option<&mut HideoutArea> {
        self.areas.iter_mut().find(|a| a.area_type == area_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HideoutArea {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(rename = "type", default, deserialize_with = "lenient::int")]
    pub area_type: i64,

    #[serde(default)]
    pub stages: IndexMap<String, AreaStage>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStage {
    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A construction or production requirement.
///
/// `kind` is "Item", "Area", "Tool", "Skill", etc.; the other fields are
/// present depending on the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(rename = "areaType", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub area_type: Option<i64>,

    #[serde(rename = "requiredLevel", default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub required_level: Option<i64>,

    #[serde(rename = "templateId", default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    #[serde(rename = "isFunctional", default, skip_serializing_if = "Option::is_none")]
    pub is_functional: Option<bool>,

    #[serde(rename = "isEncoded", default, skip_serializing_if = "Option::is_none")]
    pub is_encoded: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Requirement {
    pub fn is(&self, kind: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind)
    }

    pub fn area(area_type: i64, required_level: i64) -> Self {
        Requirement {
            kind: "Area".to_string(),
            area_type: Some(area_type),
            required_level: Some(required_level),
            ..Default::default()
        }
    }

    pub fn item(template_id: &str, count: i64) -> Self {
        Requirement {
            kind: "Item".to_string(),
            template_id: Some(template_id.to_string()),
            count: Some(count),
            ..Default::default()
        }
    }

    pub fn tool(template_id: &str) -> Self {
        Requirement {
            kind: "Tool".to_string(),
            template_id: Some(template_id.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HideoutProduction {
    #[serde(default)]
    pub recipes: Vec<Recipe>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "areaType", default, deserialize_with = "lenient::int")]
    pub area_type: i64,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(rename = "productionTime", default, deserialize_with = "lenient::int")]
    pub production_time: i64,

    #[serde(rename = "endProduct", default)]
    pub end_product: String,

    #[serde(default, deserialize_with = "lenient::int")]
    pub count: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
