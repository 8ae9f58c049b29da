//! Hideout construction gates, crafts and post-raid area bonuses.

use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{ContentManager, Outcome};
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::hideout::{Recipe, Requirement};
use crate::db::{Database, Hideout};
use crate::ids;
use crate::reference::{AREA_GENERATOR, AREA_SECURITY, AREA_WATER_COLLECTOR, ROUBLES};

/// One rolled bonus line: a template and an inclusive amount range
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaBonus {
    #[serde(deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub amount_min: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub amount_max: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemRequirementConfig {
    #[serde(rename = "templateId", deserialize_with = "lenient::string")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub count: i64,
    #[serde(deserialize_with = "lenient::lenient")]
    pub tool: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AreaRequirementConfig {
    #[serde(rename = "type", deserialize_with = "lenient::int")]
    pub area_type: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub level: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CraftConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub result_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub time: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub result_count: i64,
    #[serde(deserialize_with = "lenient::vec")]
    pub requirements: Vec<ItemRequirementConfig>,
}

/// Per-area settings, keyed by stage level where staged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub clear_crafts: bool,
    #[serde(deserialize_with = "lenient::map")]
    pub stage_item_requirements: IndexMap<String, Vec<ItemRequirementConfig>>,
    #[serde(deserialize_with = "lenient::map")]
    pub stage_area_requirements: IndexMap<String, Vec<AreaRequirementConfig>>,
    #[serde(deserialize_with = "lenient::map")]
    pub stage_crafts: IndexMap<String, IndexMap<String, CraftConfig>>,
    #[serde(deserialize_with = "lenient::map")]
    pub stage_survive_bonuses: IndexMap<String, Vec<Vec<AreaBonus>>>,
    #[serde(deserialize_with = "lenient::map")]
    pub stage_death_bonuses: IndexMap<String, Vec<Vec<AreaBonus>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HideoutConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_generator_stage_one_security_requirement: bool,
    #[serde(deserialize_with = "lenient::lenient")]
    pub remove_water_collector_stage_one_security_requirement: bool,
    /// area type (as a string) → area settings
    #[serde(deserialize_with = "lenient::map")]
    pub area_types: IndexMap<String, AreaConfig>,
}

#[derive(Debug, Default)]
pub struct HideoutManager {
    config: HideoutConfig,
}

impl HideoutManager {
    /// Roll one bonus bucket for an area at a stage level.
    ///
    /// Reads the config whether or not the manager is enabled. Unknown
    /// areas, stages or empty bucket lists yield nothing.
    pub fn area_bonus<R: Rng + ?Sized>(&self, area_type: i64, level: i64, outcome: Outcome, rng: &mut R) -> Vec<AreaBonus> {
        let Some(area) = self.config.area_types.get(&area_type.to_string()) else {
            return Vec::new();
        };
        let stages = match outcome {
            Outcome::Death => &area.stage_death_bonuses,
            Outcome::Survive => &area.stage_survive_bonuses,
        };
        let Some(buckets) = stages.get(&level.to_string()).filter(|b| !b.is_empty()) else {
            return Vec::new();
        };
        buckets[rng.gen_range(0..buckets.len())].clone()
    }
}

impl ContentManager for HideoutManager {
    fn name(&self) -> &'static str {
        "Hideout"
    }

    fn config_name(&self) -> &'static str {
        "HideoutConfig"
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let hideout = &mut db.hideout;

        if self.config.remove_generator_stage_one_security_requirement {
            clear_stage_one_gate(hideout, AREA_GENERATOR, AREA_SECURITY);
        }
        if self.config.remove_water_collector_stage_one_security_requirement {
            clear_stage_one_gate(hideout, AREA_WATER_COLLECTOR, AREA_SECURITY);
        }

        let crafting = CraftingFlags {
            instant: ctx.debug.instant_crafting,
            easy: ctx.debug.easy_crafting,
        };

        for (key, config) in &self.config.area_types {
            let Ok(area_type) = key.trim().parse::<i64>() else {
                continue;
            };
            if !hideout.areas.iter().any(|a| a.area_type == area_type) {
                debug!(area = area_type, "hideout area not found");
                continue;
            }

            if config.clear_crafts {
                hideout.production.recipes.retain(|r| r.area_type != area_type);
            }
            apply_stage_requirements(hideout, area_type, config);
            add_stage_crafts(hideout, area_type, config, crafting);
        }

        info!("Hideout changes applied");
    }
}

// Internal helper functions

#[derive(Debug, Clone, Copy)]
struct CraftingFlags {
    instant: bool,
    easy: bool,
}

/// Drop the stage 1 "requires area X" level gate of an area
fn clear_stage_one_gate(hideout: &mut Hideout, target: i64, required: i64) {
    let Some(stage) = hideout.area_mut(target).and_then(|a| a.stages.get_mut("1")) else {
        return;
    };
    for req in &mut stage.requirements {
        if req.is("Area") && req.area_type == Some(required) {
            req.required_level = Some(0);
        }
    }
}

/// Replace item and area requirements of every configured stage
fn apply_stage_requirements(hideout: &mut Hideout, area_type: i64, config: &AreaConfig) {
    let Some(area) = hideout.area_mut(area_type) else {
        return;
    };

    for (stage_key, stage) in &mut area.stages {
        if let Some(items) = config.stage_item_requirements.get(stage_key) {
            stage.requirements.retain(|r| !r.is("Item"));
            for req in items.iter().filter(|r| ids::is_valid(&r.template_id)) {
                let mut requirement = Requirement::item(&req.template_id, req.count);
                requirement.is_functional = Some(false);
                requirement.is_encoded = Some(false);
                stage.requirements.push(requirement);
            }
        }

        if let Some(areas) = config.stage_area_requirements.get(stage_key) {
            stage.requirements.retain(|r| !r.is("Area"));
            for req in areas {
                let mut requirement = Requirement::area(req.area_type, req.level);
                requirement.is_encoded = Some(false);
                stage.requirements.push(requirement);
            }
        }
    }
}

fn add_stage_crafts(hideout: &mut Hideout, area_type: i64, config: &AreaConfig, flags: CraftingFlags) {
    for (stage_key, crafts) in &config.stage_crafts {
        let stage_level = stage_key.trim().parse::<i64>().unwrap_or(0);

        for craft in crafts.values() {
            if !ids::is_valid(&craft.id) || !ids::is_valid(&craft.result_id) {
                continue;
            }

            let mut requirements = vec![Requirement::area(area_type, stage_level)];
            if flags.easy {
                requirements.push(plain_item(ROUBLES, 1, "Item"));
            } else {
                for req in craft.requirements.iter().filter(|r| ids::is_valid(&r.template_id)) {
                    let kind = if req.tool { "Tool" } else { "Item" };
                    requirements.push(plain_item(&req.template_id, req.count, kind));
                }
            }

            hideout.production.recipes.push(Recipe {
                id: craft.id.clone(),
                area_type,
                requirements,
                production_time: if flags.instant { 1 } else { craft.time },
                end_product: craft.result_id.clone(),
                count: craft.result_count,
                extra: recipe_defaults(),
            });
        }
    }
}

fn plain_item(template_id: &str, count: i64, kind: &str) -> Requirement {
    Requirement {
        kind: kind.to_string(),
        template_id: Some(template_id.to_string()),
        count: Some(count),
        is_functional: Some(false),
        is_encoded: Some(false),
        ..Default::default()
    }
}

fn recipe_defaults() -> Map<String, Value> {
    let mut extra = Map::new();
    for key in ["needFuelForAllProductionTime", "locked", "continuous", "isEncoded", "isCodeProduction"] {
        extra.insert(key.to_string(), Value::Bool(false));
    }
    extra.insert("productionLimitCount".to_string(), Value::from(0));
    extra
}
