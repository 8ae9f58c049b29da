//! Preset resolution.
//!
//! A preset is a named list of raw item entries in the Presets config, either
//! at top level (`items`) or inside a category (`categorizedItems`).
//! Resolving one rebuilds it as a rooted item tree with fresh instance ids,
//! assigns durability by preset class and stamps the preset's stable catalog
//! key into the root.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::config::lenient;
use crate::db::item::Repairable;
use crate::db::{Database, Item, ItemPreset, Upd};
use crate::ids;
use crate::locale::LocaleOverlay;
use crate::reference::HIDEOUT;

/// Additional attempts when a randomly picked preset fails to resolve
pub const RANDOM_RETRIES: usize = 10;

/// Category sentinels accepted by [`PresetResolver::resolve_random`]
pub const ALL_CATEGORIES: &str = "__all__";
pub const ALL_WEAPONS: &str = "__all__weapon__";
pub const ALL_ARMOR: &str = "__all__armor__";
pub const ALL_EQUIPMENT: &str = "__all__equipment__";

/// Durability class: (name marker, config key prefix, default durability)
///
/// Checked in order; the first marker contained in the preset id wins.
pub const DURABILITY_CLASSES: &[(&str, &str, i64)] = &[
    ("basic", "basic", 30),
    ("std", "std", 50),
    ("adv", "adv", 80),
    ("sup", "sup", 100),
    ("master", "master", 100),
    ("melee barter", "meleeBarter", 80),
    ("contractor", "contractor", 80),
    ("info barter", "infoBarter", 80),
    ("btc barter", "BTCBarter", 100),
    ("edition", "bossWeapon", 90),
];

const NO_RENAME_MARKERS: [&str; 4] = ["MOUNTED", "SHADE", "EYECUP", "COLLIMATOR"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresetsConfig {
    #[serde(deserialize_with = "lenient::lenient")]
    pub enabled: bool,

    #[serde(rename = "alwaysFullDurability", deserialize_with = "lenient::lenient")]
    pub always_full_durability: bool,

    #[serde(deserialize_with = "lenient::map")]
    pub items: IndexMap<String, Vec<Value>>,

    #[serde(rename = "categorizedItems", deserialize_with = "lenient::map")]
    pub categorized_items: IndexMap<String, IndexMap<String, Vec<Value>>>,

    #[serde(rename = "weaponCategories", deserialize_with = "lenient::vec")]
    pub weapon_categories: Vec<String>,

    #[serde(rename = "armorCategories", deserialize_with = "lenient::vec")]
    pub armor_categories: Vec<String>,

    #[serde(rename = "equipmentCategories", deserialize_with = "lenient::vec")]
    pub equipment_categories: Vec<String>,

    /// Per-class `<class>Durability` / `<class>MaxDurability` values
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PresetsConfig {
    fn int(&self, key: &str, default: i64) -> i64 {
        self.extra
            .get(key)
            .and_then(lenient::as_int)
            .unwrap_or(default)
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "_id", default, deserialize_with = "lenient::string")]
    id: String,
    #[serde(rename = "_tpl", default, deserialize_with = "lenient::string")]
    tpl: String,
    #[serde(rename = "parentId", default, deserialize_with = "lenient::opt_string")]
    parent_id: Option<String>,
    #[serde(rename = "slotId", default, deserialize_with = "lenient::opt_string")]
    slot_id: Option<String>,
    #[serde(default)]
    upd: Option<Value>,
}

/// A resolved preset: a root item and its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPreset {
    pub root_id: String,
    pub items: Vec<Item>,
}

impl ResolvedPreset {
    pub fn root(&self) -> Option<&Item> {
        self.items.iter().find(|i| ids::same(&i.id, &self.root_id))
    }

    pub fn root_mut(&mut self) -> Option<&mut Item> {
        let root_id = self.root_id.clone();
        self.items.iter_mut().find(|i| ids::same(&i.id, &root_id))
    }
}

/// Resolves presets from the Presets config and caches their catalog keys.
#[derive(Debug, Default)]
pub struct PresetResolver {
    config: PresetsConfig,
    keys: HashMap<String, String>,
}

impl PresetResolver {
    pub fn new(config: PresetsConfig) -> Self {
        PresetResolver {
            config,
            keys: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PresetsConfig {
        &self.config
    }

    /// Every configured preset id, top-level entries first
    pub fn all_preset_ids(&self) -> Vec<String> {
        self.config
            .items
            .keys()
            .chain(self.config.categorized_items.values().flat_map(|c| c.keys()))
            .cloned()
            .collect()
    }

    fn entries(&self, preset_id: &str) -> Option<&[Value]> {
        if let Some(entries) = self.config.items.get(preset_id) {
            return Some(entries);
        }
        self.config
            .categorized_items
            .values()
            .find_map(|category| category.get(preset_id))
            .map(Vec::as_slice)
    }

    /// Stable catalog key of a preset.
    ///
    /// Derived from the lowercased preset id and root template on first use,
    /// then cached for the life of the resolver.
    pub fn preset_key(&mut self, preset_id: &str, root_tpl: Option<&str>) -> String {
        let cache_key = preset_id.to_ascii_lowercase();
        if let Some(existing) = self.keys.get(&cache_key) {
            return existing.clone();
        }
        let seed = match root_tpl.filter(|t| !t.trim().is_empty()) {
            Some(tpl) => format!("{preset_id}:{tpl}"),
            None => preset_id.to_string(),
        };
        let key = ids::sha24(&seed.to_lowercase());
        self.keys.insert(cache_key, key.clone());
        key
    }

    /// Resolve a preset into a fresh item tree.
    ///
    /// The root gets slot `hideout` and, when given, `parent_id`.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        preset_id: &str,
        parent_id: Option<&str>,
        rng: &mut R,
    ) -> Option<ResolvedPreset> {
        let Some(entries) = self.entries(preset_id) else {
            error!(preset = preset_id, "could not find preset");
            return None;
        };
        let entries: Vec<RawEntry> = entries
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| RawEntry::deserialize(v).ok())
            .collect();

        let mut preset = build_tree(preset_id, &entries, parent_id)?;
        regenerate_ids(&mut preset, rng);

        let root_tpl = preset.root().map(|r| r.tpl.clone());
        let key = self.preset_key(preset_id, root_tpl.as_deref());
        let durability = self.durability_for(preset_id);
        if let Some(root) = preset.root_mut() {
            let upd = root.upd.get_or_insert_with(Upd::default);
            upd.spt_preset_id = Some(key);
            match durability {
                Durability::Force(r) => upd.repairable = Some(r),
                Durability::Default(r) if upd.repairable.is_none() => upd.repairable = Some(r),
                _ => {}
            }
        }

        Some(preset)
    }

    fn durability_for(&self, preset_id: &str) -> Durability {
        if self.config.always_full_durability {
            return Durability::Force(Repairable {
                durability: 100.0,
                max_durability: 100.0,
            });
        }
        let id = preset_id.to_lowercase();
        DURABILITY_CLASSES
            .iter()
            .find(|(marker, _, _)| id.contains(marker))
            .map_or(Durability::Keep, |(_, key, default)| {
                Durability::Default(Repairable {
                    durability: self.config.int(&format!("{key}Durability"), *default) as f64,
                    max_durability: self.config.int(&format!("{key}MaxDurability"), 100) as f64,
                })
            })
    }

    /// Resolve a random preset drawn from categories and an include list.
    pub fn resolve_random<R: Rng + ?Sized>(
        &mut self,
        categories: &[String],
        excluded: &[String],
        included: &[String],
        parent_id: Option<&str>,
        rng: &mut R,
    ) -> Option<ResolvedPreset> {
        let mut categories: Vec<String> = categories.to_vec();
        let has = |list: &[String], sentinel: &str| list.iter().any(|c| c.eq_ignore_ascii_case(sentinel));
        if has(&categories, ALL_CATEGORIES) {
            categories = self.config.categorized_items.keys().cloned().collect();
        }
        if has(&categories, ALL_WEAPONS) {
            categories = self.config.weapon_categories.clone();
        }
        if has(&categories, ALL_ARMOR) {
            categories = self.config.armor_categories.clone();
        }
        if has(&categories, ALL_EQUIPMENT) {
            categories = self.config.equipment_categories.clone();
        }

        let mut candidates: Vec<String> = included
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();
        for name in &categories {
            if let Some(category) = self.config.categorized_items.get(name) {
                for preset_id in category.keys() {
                    if !candidates.contains(preset_id) {
                        candidates.push(preset_id.clone());
                    }
                }
            }
        }
        let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
        candidates.retain(|p| !excluded.contains(p.as_str()));

        if candidates.is_empty() {
            error!("could not find random preset");
            return None;
        }

        for _ in 0..=RANDOM_RETRIES {
            let pick = candidates[rng.gen_range(0..candidates.len())].clone();
            if let Some(preset) = self.resolve(&pick, parent_id, rng) {
                return Some(preset);
            }
        }

        error!("could not find random preset");
        None
    }

    /// Publish a preset into the catalog and name it in every locale
    pub fn set_preset<R: Rng + ?Sized>(
        &mut self,
        preset_id: &str,
        db: &mut Database,
        locale: &mut LocaleOverlay,
        rng: &mut R,
    ) -> bool {
        let Some(preset) = self.resolve(preset_id, None, rng) else {
            return false;
        };
        let root_tpl = preset.root().map(|r| r.tpl.clone());
        let key = self.preset_key(preset_id, root_tpl.as_deref());

        if !ids::is_valid(&key) || !ids::is_valid(&preset.root_id) {
            warn!(preset = preset_id, "invalid preset id");
            return false;
        }

        let display_id = replace_first_underscore(preset_id).to_uppercase();
        let change_weapon_name = !NO_RENAME_MARKERS.iter().any(|m| display_id.contains(m));
        let encyclopedia = if preset_id.to_lowercase().contains("basic") {
            root_tpl.clone().filter(|t| !t.trim().is_empty())
        } else {
            None
        };

        db.globals.item_presets.insert(
            key.clone(),
            ItemPreset {
                id: key.clone(),
                kind: "Preset".to_string(),
                change_weapon_name,
                name: display_id,
                parent: preset.root_id.clone(),
                items: preset.items,
                encyclopedia,
                extra: Map::new(),
            },
        );

        let name = display_name(preset_id, root_tpl.as_deref(), locale, db);
        if !name.trim().is_empty() {
            locale.set_all(&mut db.locales, &key, &name);
        }
        true
    }
}

enum Durability {
    Force(Repairable),
    Default(Repairable),
    Keep,
}

// Internal helper functions

fn build_tree(preset_id: &str, entries: &[RawEntry], parent_id: Option<&str>) -> Option<ResolvedPreset> {
    let mut roots = entries.iter().filter(|entry| match entry.parent_id.as_deref() {
        None => true,
        Some(p) if p.trim().is_empty() => true,
        Some(p) => !entries.iter().any(|e| e.id == p),
    });
    let Some(root) = roots.next() else {
        error!(preset = preset_id, "could not find root item for preset");
        return None;
    };
    // the first candidate wins
    if let Some(other) = roots.next() {
        warn!(preset = preset_id, root = %root.id, other = %other.id, "preset has more than one root item");
    }

    let upd = |raw: &Option<Value>| raw.as_ref().and_then(|v| Upd::deserialize(v).ok());

    let mut root_item = Item::new(root.id.clone(), root.tpl.clone());
    root_item.slot_id = Some(HIDEOUT.to_string());
    root_item.parent_id = parent_id.filter(|p| !p.trim().is_empty()).map(str::to_string);
    root_item.upd = upd(&root.upd);

    let mut items = vec![root_item];
    for entry in entries.iter().filter(|e| e.tpl != root.tpl) {
        let mut item = Item::new(entry.id.clone(), entry.tpl.clone()).with_parent(
            entry.parent_id.clone().unwrap_or_default(),
            entry.slot_id.clone().unwrap_or_default(),
        );
        item.upd = upd(&entry.upd);
        items.push(item);
    }

    Some(ResolvedPreset {
        root_id: root.id.clone(),
        items,
    })
}

fn regenerate_ids<R: Rng + ?Sized>(preset: &mut ResolvedPreset, rng: &mut R) {
    let mut map: HashMap<String, String> = HashMap::new();
    for item in &preset.items {
        if !item.id.trim().is_empty() && !map.contains_key(&item.id) {
            map.insert(item.id.clone(), ids::generate(rng));
        }
    }
    for item in &mut preset.items {
        // the root keeps the caller's parent
        let is_root = item.id == preset.root_id;
        if let Some(new_id) = map.get(&item.id) {
            item.id = new_id.clone();
        }
        if is_root {
            continue;
        }
        if let Some(new_parent) = item.parent_id.as_ref().and_then(|p| map.get(p)) {
            item.parent_id = Some(new_parent.clone());
        }
    }
    if let Some(new_root) = map.get(&preset.root_id) {
        preset.root_id = new_root.clone();
    }
}

fn replace_first_underscore(value: &str) -> String {
    value.replacen('_', " ", 1)
}

fn normalize(value: &str) -> Vec<char> {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Byte length of the shortest prefix of `source` whose letters and digits spell `prefix`
fn normalized_prefix_len(source: &str, prefix: &[char]) -> Option<usize> {
    if prefix.is_empty() {
        return None;
    }
    let mut matched = 0;
    for (i, ch) in source.char_indices() {
        if !ch.is_alphanumeric() {
            continue;
        }
        for lower in ch.to_lowercase() {
            if prefix.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
        if matched == prefix.len() {
            return Some(i + ch.len_utf8());
        }
    }
    None
}

fn display_name(preset_id: &str, root_tpl: Option<&str>, locale: &mut LocaleOverlay, db: &mut Database) -> String {
    let raw = preset_id.replace('_', " ").trim().to_string();
    let Some(tpl) = root_tpl.filter(|t| !t.trim().is_empty()) else {
        return raw;
    };
    let Some(short_name) = locale.try_get_en(&mut db.locales, &format!("{tpl} ShortName")) else {
        return raw;
    };

    let base = normalize(&short_name);
    if base.is_empty() || !normalize(&raw).starts_with(&base) {
        return raw;
    }
    match normalized_prefix_len(&raw, &base) {
        Some(len) if len < raw.len() => {
            let suffix = raw[len..].trim();
            if suffix.is_empty() {
                raw
            } else {
                suffix.to_string()
            }
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LazyTable, LocaleMap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const AK: &str = "5ac66d2e5acfc43b321d4b53";

    fn config() -> PresetsConfig {
        serde_json::from_value(json!({
            "enabled": true,
            "stdDurability": 55,
            "items": {
                "AK_basic": [
                    { "_id": "root", "_tpl": AK },
                    { "_id": "mag", "_tpl": "mag", "parentId": "root", "slotId": "mod_magazine" },
                    { "_id": "round", "_tpl": "ammo", "parentId": "mag", "slotId": "cartridges", "upd": { "StackObjectsCount": 30 } },
                    { "_id": "dup", "_tpl": AK, "parentId": "root", "slotId": "x" }
                ],
                "orphans": [
                    { "_id": "a", "_tpl": "t", "parentId": "b" },
                    { "_id": "b", "_tpl": "t", "parentId": "a" }
                ],
                "repaired_std": [
                    { "_id": "r", "_tpl": AK, "upd": { "Repairable": { "Durability": 12, "MaxDurability": 40 } } }
                ]
            },
            "categorizedItems": {
                "rifles": {
                    "AK_std": [{ "_id": "x", "_tpl": AK }],
                    "AK_adv_master": [{ "_id": "x", "_tpl": AK }]
                },
                "pistols": {
                    "PM_sup": [{ "_id": "p", "_tpl": "pm" }]
                }
            },
            "weaponCategories": ["pistols"]
        }))
        .unwrap()
    }

    fn shape(preset: &ResolvedPreset) -> Vec<(String, Option<String>, Option<String>)> {
        let index: HashMap<&str, usize> = preset
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id.as_str(), i))
            .collect();
        preset
            .items
            .iter()
            .map(|i| {
                let parent = i
                    .parent_id
                    .as_deref()
                    .map(|p| index.get(p).map_or(p.to_string(), |n| n.to_string()));
                (i.tpl.clone(), i.slot_id.clone(), parent)
            })
            .collect()
    }

    #[test]
    fn test_resolve_builds_rooted_tree() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(1);
        let preset = resolver.resolve("AK_basic", Some("stash"), &mut rng).unwrap();

        assert_eq!(preset.items.len(), 3);
        let root = preset.root().unwrap();
        assert_eq!(root.tpl, AK);
        assert_eq!(root.slot_id.as_deref(), Some("hideout"));
        assert_eq!(root.parent_id.as_deref(), Some("stash"));
        assert!(ids::is_valid(&preset.root_id));
        assert_eq!(preset.items[1].parent_id.as_deref(), Some(preset.root_id.as_str()));
        assert_eq!(preset.items[2].stack_count(), Some(30));
    }

    #[test]
    fn test_re_resolution_is_isomorphic_with_disjoint_ids() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(7);
        let a = resolver.resolve("AK_basic", None, &mut rng).unwrap();
        let b = resolver.resolve("AK_basic", None, &mut rng).unwrap();

        let a_ids: HashSet<&str> = a.items.iter().map(|i| i.id.as_str()).collect();
        assert!(b.items.iter().all(|i| !a_ids.contains(i.id.as_str())));
        assert_eq!(shape(&a), shape(&b));
        assert_eq!(
            a.root().and_then(|r| r.upd.as_ref()).and_then(|u| u.spt_preset_id.clone()),
            b.root().and_then(|r| r.upd.as_ref()).and_then(|u| u.spt_preset_id.clone())
        );
    }

    #[test]
    fn test_preset_key_is_stable() {
        let mut resolver = PresetResolver::new(config());
        let key = resolver.preset_key("AK_basic", Some(AK));
        assert_eq!(key, ids::sha24(&format!("ak_basic:{AK}")));
        assert_eq!(resolver.preset_key("AK_basic", None), key);
        assert_eq!(resolver.preset_key("AK_BASIC", None), key);

        let mut fresh = PresetResolver::new(config());
        assert_eq!(fresh.preset_key("AK_basic", Some(AK)), key);
        assert_eq!(fresh.preset_key("no_tpl", None), ids::sha24("no_tpl"));
    }

    #[test]
    fn test_no_root_fails() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(resolver.resolve("orphans", None, &mut rng).is_none());
        assert!(resolver.resolve("missing", None, &mut rng).is_none());
    }

    #[test]
    fn test_root_keeps_caller_parent_matching_entry_id() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(5);
        let preset = resolver.resolve("PM_sup", Some("p"), &mut rng).unwrap();

        let root = preset.root().unwrap();
        assert_ne!(root.id, "p");
        assert_eq!(root.parent_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_first_of_several_roots_wins() {
        let entries: Vec<RawEntry> = serde_json::from_value(json!([
            { "_id": "first", "_tpl": AK },
            { "_id": "second", "_tpl": "pm" },
            { "_id": "mag", "_tpl": "mag", "parentId": "first", "slotId": "mod_magazine" }
        ]))
        .unwrap();

        let preset = build_tree("twins", &entries, None).unwrap();
        assert_eq!(preset.root_id, "first");
        assert_eq!(preset.root().map(|r| r.tpl.as_str()), Some(AK));
    }

    #[test]
    fn test_durability_classes() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(1);
        let repairable = |p: &ResolvedPreset| p.root().and_then(|r| r.upd.as_ref()).and_then(|u| u.repairable);

        let basic = resolver.resolve("AK_basic", None, &mut rng).unwrap();
        assert_eq!(repairable(&basic).map(|r| r.durability), Some(30.0));

        let std = resolver.resolve("AK_std", None, &mut rng).unwrap();
        assert_eq!(repairable(&std).map(|r| r.durability), Some(55.0));

        // "adv" is checked before "master"
        let adv = resolver.resolve("AK_adv_master", None, &mut rng).unwrap();
        assert_eq!(repairable(&adv).map(|r| r.durability), Some(80.0));

        let kept = resolver.resolve("repaired_std", None, &mut rng).unwrap();
        assert_eq!(repairable(&kept).map(|r| r.durability), Some(12.0));

        let mut cfg = config();
        cfg.always_full_durability = true;
        let mut full = PresetResolver::new(cfg);
        let kept = full.resolve("repaired_std", None, &mut rng).unwrap();
        assert_eq!(repairable(&kept).map(|r| r.max_durability), Some(100.0));
        assert_eq!(repairable(&kept).map(|r| r.durability), Some(100.0));
    }

    #[test]
    fn test_resolve_random_respects_filters() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let preset = resolver
                .resolve_random(
                    &[ALL_CATEGORIES.to_string()],
                    &["AK_std".to_string(), "AK_adv_master".to_string()],
                    &[],
                    None,
                    &mut rng,
                )
                .unwrap();
            assert_eq!(preset.root().map(|r| r.tpl.as_str()), Some("pm"));
        }

        let weapons = resolver
            .resolve_random(&[ALL_WEAPONS.to_string()], &[], &[], Some("p"), &mut rng)
            .unwrap();
        assert_eq!(weapons.root().and_then(|r| r.parent_id.as_deref()), Some("p"));

        assert!(resolver
            .resolve_random(&["nothing".to_string()], &[], &[], None, &mut rng)
            .is_none());
        assert!(resolver
            .resolve_random(&[], &[], &["orphans".to_string()], None, &mut rng)
            .is_none());
    }

    #[test]
    fn test_all_preset_ids() {
        let resolver = PresetResolver::new(config());
        assert_eq!(
            resolver.all_preset_ids(),
            vec!["AK_basic", "orphans", "repaired_std", "AK_std", "AK_adv_master", "PM_sup"]
        );
    }

    #[test]
    fn test_set_preset_publishes_catalog_entry() {
        let mut resolver = PresetResolver::new(config());
        let mut rng = StdRng::seed_from_u64(5);
        let mut db = Database::default();
        let mut en = LocaleMap::new();
        en.insert(format!("{AK} ShortName"), "AK".into());
        db.locales.global.insert("en".into(), LazyTable::new(en));
        let mut locale = LocaleOverlay::new();

        assert!(!resolver.set_preset("orphans", &mut db, &mut locale, &mut rng));
        assert!(resolver.set_preset("AK_basic", &mut db, &mut locale, &mut rng));

        let key = resolver.preset_key("AK_basic", None);
        let entry = &db.globals.item_presets[&key];
        assert_eq!(entry.name, "AK BASIC");
        assert!(entry.change_weapon_name);
        assert_eq!(entry.encyclopedia.as_deref(), Some(AK));
        assert_eq!(entry.kind, "Preset");
        assert_eq!(locale.get_en(&mut db.locales, &key), "basic");
    }

    #[test]
    fn test_display_name_prefix() {
        assert_eq!(normalized_prefix_len("AK-74 basic", &normalize("ak74")), Some(5));
        assert_eq!(normalized_prefix_len("M4 basic", &normalize("ak")), None);
        assert_eq!(replace_first_underscore("MP5_Kurz_std"), "MP5 Kurz_std");
    }
}
