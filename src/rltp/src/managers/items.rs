//! Cloned item templates, rarity colors, stimulator buffs and a few fixed
//! compatibility patches.
//!
//! A clone is built by serializing the source template, rewriting every
//! occurrence of the source id to the new id, then merging the configured
//! `changes` over it with [`merge_properties`].

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::ContentManager;
use crate::config::{lenient, ConfigTree};
use crate::context::Context;
use crate::db::template::Slot;
use crate::db::{Database, ItemTemplate};
use crate::ids;
use crate::reference::{rarity_color, DEFAULT_INVENTORY};

/// Rifles whose launcher slot accepts the newer under-barrel launcher
const UBGL_HOSTS: [&str; 20] = [
    "59e6152586f77473dc057aa1",
    "67495c74dfe62c2d7400002a",
    "59e6687d86f77411d949b251",
    "67495c74dfe62c2d74000029",
    "5ac66cb05acfc40198510a10",
    "5ac66d2e5acfc43b321d4b53",
    "6499849fc93611967b034949",
    "67495c74dfe62c2d74000045",
    "5bf3e03b0db834001d2c4a9c",
    "67495c74dfe62c2d74000032",
    "5644bd2b4bdc2d3b4c8b4572",
    "5ac4cd105acfc40016339859",
    "5bf3e0490db83400196199af",
    "5ab8e9fcd8ce870019439434",
    "59d6088586f774275f37482f",
    "67474dd2a7f5b436b8000025",
    "67495c74dfe62c2d7400003d",
    "59ff346386f77477562ff5e2",
    "5abcbc27d8ce8700182eceeb",
    "5a0ec13bfcdbcb00165aa685",
];
const UBGL: &str = "67495c74dfe62c2d7400002d";

const OLDER_LAUNCHER_HOSTS: [&str; 2] = ["55d3632e4bdc2d972f8b4569", "63d3ce0446bd475bcb50f55f"];
const OLDER_UBGL: &str = "67495c74dfe62c2d7400002c";

const BUBEN: &str = "6513f0a194c72326990a3868";
const TKM_366: [&str; 4] = [
    "59e655cb86f77411dc52a77b",
    "59e6542b86f77411dc52a77a",
    "59e6658b86f77411d949b250",
    "5f0596629e22f464da6bbdd9",
];

const T5000: &str = "5df25b6c0b92095fd441e4cf";
const AMMO_6851: [&str; 2] = ["6529302b8c26af6326029fb7", "6529243824cbe3c74a05e5c1"];

/// Path of the stimulator buff table inside the globals tree
const BUFFS_POINTER: &str = "/Health/Effects/Stimulator/Buffs";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuffConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub buff_type: String,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub chance: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub delay: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    pub value: Option<f64>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub absolute_value: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub skill_name: String,
}

impl BuffConfig {
    /// The buff entry as stored in the globals table
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "BuffType": self.buff_type,
            "Chance": self.chance.unwrap_or(1.0),
            "Delay": self.delay.unwrap_or(1.0),
            "Duration": self.duration.unwrap_or(60.0),
            "Value": self.value.unwrap_or(0.0),
            "AbsoluteValue": self.absolute_value.unwrap_or(true),
            "SkillName": self.skill_name,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemConfig {
    #[serde(deserialize_with = "lenient::string")]
    pub copy_template_id: String,
    /// Property overrides; `_id` is the clone's id
    #[serde(deserialize_with = "lenient::lenient")]
    pub changes: Map<String, Value>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub slot_id: Option<String>,
    #[serde(deserialize_with = "lenient::lenient")]
    pub copy_locale: bool,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub mod_title: Option<String>,
    /// Tier number, code or name
    #[serde(deserialize_with = "lenient::lenient")]
    pub rarity: Value,
    #[serde(deserialize_with = "lenient::map")]
    pub buffs: IndexMap<String, BuffConfig>,
}

impl ItemConfig {
    fn new_id(&self) -> Option<&str> {
        self.changes.get("_id").and_then(Value::as_str).filter(|id| ids::is_valid(id))
    }

    fn rarity(&self) -> Option<String> {
        match &self.rarity {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(_) => lenient::as_int(&self.rarity).map(|n| n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::map")]
    pub items: IndexMap<String, ItemConfig>,
    #[serde(rename = "addUBGLCompat", deserialize_with = "lenient::lenient")]
    pub add_ubgl_compat: bool,
    #[serde(rename = "add366TKMBubenCompat", deserialize_with = "lenient::lenient")]
    pub add_366tkm_buben_compat: bool,
    #[serde(rename = "add6851T5000Compat", deserialize_with = "lenient::lenient")]
    pub add_6851_t5000_compat: bool,
}

#[derive(Debug, Default)]
pub struct ItemsManager {
    config: ItemsConfig,
}

impl ContentManager for ItemsManager {
    fn name(&self) -> &'static str {
        "Items"
    }

    fn config_name(&self) -> &'static str {
        "ItemsConfig"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn load_config(&mut self, tree: &ConfigTree, _ctx: &mut Context) {
        self.config = tree.project(self.config_name());
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn post_db(&mut self, db: &mut Database, ctx: &mut Context) {
        let mut added = 0;
        for (name, item) in &self.config.items {
            if add_item(db, ctx, name, item) {
                added += 1;
            }
        }

        if self.config.add_ubgl_compat {
            for host in UBGL_HOSTS {
                allow_in_slots(db, host, "mod_launcher", &[UBGL], SlotList::Slots);
            }
            for host in OLDER_LAUNCHER_HOSTS {
                allow_in_slots(db, host, "mod_launcher", &[OLDER_UBGL], SlotList::Slots);
            }
        }
        if self.config.add_366tkm_buben_compat {
            allow_in_slots(db, BUBEN, "cartridges", &TKM_366, SlotList::Cartridges);
        }
        if self.config.add_6851_t5000_compat {
            allow_in_slots(db, T5000, "cartridges", &AMMO_6851, SlotList::Cartridges);
        }

        info!(added, "Items changes applied");
    }
}

/// Recursively merge `changes` into `target`.
///
/// Only keys the target already has are touched. Objects merge key by key.
/// Arrays of equal non-zero length merge element-wise when the target holds
/// objects and are replaced when it holds scalars; other arrays are replaced.
/// An empty-string change stops merging the current object.
pub fn merge_properties(target: &mut Map<String, Value>, changes: &Map<String, Value>) {
    for (key, change) in changes {
        if change.is_null() {
            continue;
        }
        let Some(current) = target.get_mut(key).filter(|v| !v.is_null()) else {
            continue;
        };

        match (current, change) {
            (Value::Array(items), Value::Array(overrides)) if !overrides.is_empty() && items.len() == overrides.len() => {
                if !items[0].is_array() && !items[0].is_object() {
                    *items = overrides.clone();
                    continue;
                }
                for (item, config) in items.iter_mut().zip(overrides) {
                    if let (Value::Object(item), Value::Object(config)) = (item, config) {
                        merge_properties(item, config);
                    }
                }
            }
            (Value::Object(inner), Value::Object(config)) => merge_properties(inner, config),
            (_, Value::String(s)) if s.is_empty() => return,
            (current, change) => *current = change.clone(),
        }
    }
}

// Internal helper functions

fn add_item(db: &mut Database, ctx: &mut Context, name: &str, config: &ItemConfig) -> bool {
    let Some(new_id) = config.new_id() else {
        warn!(item = %name, "Empty id in item");
        return false;
    };
    if !ids::is_valid(&config.copy_template_id) {
        return false;
    }
    let Some(source) = db.templates.item(&config.copy_template_id) else {
        error!(template = %config.copy_template_id, item = %name, "copy template not found");
        return false;
    };

    let Some(mut template) = clone_template(source, &config.copy_template_id, new_id, &config.changes) else {
        warn!(item = %new_id, "Failed to deserialize item");
        return false;
    };

    if let Some(rarity) = config.rarity() {
        template.props.background_color = Some(rarity_color(&rarity).to_string());
    }
    if !config.buffs.is_empty() {
        set_buffs(db, &mut template, &config.buffs);
    }

    db.templates.items.insert(new_id.to_string(), template);

    if let Some(slot_id) = config.slot_id.as_deref().filter(|s| !s.trim().is_empty()) {
        graft_into_inventory(db, new_id, slot_id);
    }
    if config.copy_locale {
        copy_locale(db, ctx, &config.copy_template_id, new_id, config.mod_title.as_deref());
    }
    true
}

fn clone_template(source: &ItemTemplate, source_id: &str, new_id: &str, changes: &Map<String, Value>) -> Option<ItemTemplate> {
    let text = serde_json::to_string(source).ok()?.replace(source_id, new_id);
    let mut value: Value = serde_json::from_str(&text).ok()?;
    if let Value::Object(object) = &mut value {
        merge_properties(object, changes);
    }
    serde_json::from_value(value).ok()
}

fn set_buffs(db: &mut Database, template: &mut ItemTemplate, buffs: &IndexMap<String, BuffConfig>) {
    let Some(table) = db.globals.config.pointer_mut(BUFFS_POINTER).and_then(Value::as_object_mut) else {
        error!(item = %template.id, "stimulator buffs table not found");
        return;
    };
    let name = format!("Buff{}", template.id);
    table.insert(name.clone(), Value::Array(buffs.values().map(BuffConfig::to_value).collect()));
    template.props.stimulator_buffs = Some(name);
}

/// Allow the new item in every default-inventory slot whose name contains `slot_id`
fn graft_into_inventory(db: &mut Database, new_id: &str, slot_id: &str) {
    let Some(inventory) = db.templates.item_mut(DEFAULT_INVENTORY) else {
        return;
    };
    let needle = slot_id.to_ascii_lowercase();
    for slot in inventory.props.slots.iter_mut().flatten() {
        if slot.name.to_ascii_lowercase().contains(&needle) {
            slot.allow(new_id);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotList {
    Slots,
    Cartridges,
}

fn allow_in_slots(db: &mut Database, host: &str, slot_name: &str, allowed: &[&str], list: SlotList) {
    let Some(template) = db.templates.item_mut(host) else {
        return;
    };
    let slots: &mut Vec<Slot> = match list {
        SlotList::Slots => match template.props.slots.as_mut() {
            Some(slots) => slots,
            None => return,
        },
        SlotList::Cartridges => match template.props.cartridges.as_mut() {
            Some(slots) => slots,
            None => return,
        },
    };
    for slot in slots.iter_mut().filter(|s| s.name.eq_ignore_ascii_case(slot_name)) {
        for tpl in allowed {
            slot.allow(tpl);
        }
    }
}

fn copy_locale(db: &mut Database, ctx: &mut Context, source_id: &str, new_id: &str, title: Option<&str>) {
    let locales = &mut db.locales;
    let mut name = ctx.locale.get_en(locales, &format!("{source_id} Name"));
    let mut description = ctx.locale.get_en(locales, &format!("{source_id} Description"));
    let short_name = ctx.locale.get_en(locales, &format!("{source_id} ShortName"));

    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        name = format!("{name} {title}");
        description = format!("{description} {title}");
    }

    ctx.locale.set_global_all(locales, &format!("{new_id} Name"), &name);
    ctx.locale.set_global_all(locales, &format!("{new_id} Description"), &description);
    ctx.locale.set_global_all(locales, &format!("{new_id} ShortName"), &short_name);
}
