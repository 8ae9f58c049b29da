//! The host database: every table the pipeline reads or rewrites.
//!
//! Tables are loaded from a directory tree laid out the way the host ships
//! its data:
//!
//! ```text
//! templates/items.json     templates/quests.json    templates/profiles.json
//! traders/<id>/base.json   traders/<id>/assort.json traders/<id>/questassort.json
//! globals.json             hideout/areas.json       hideout/production.json
//! bots/types/<name>.json   locales/global/<lang>.json locales/server/<lang>.json
//! configs/item.json        configs/quest.json
//! ```
//!
//! Every table except the item templates is optional.

pub mod bots;
pub mod globals;
pub mod hideout;
pub mod item;
pub mod locales;
pub mod profile;
pub mod quest;
pub mod template;
pub mod trader;

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use bots::BotType;
pub use globals::{Globals, ItemPreset, ServerConfigs};
pub use hideout::Hideout;
pub use item::{GridLocation, Item, ItemLocation, Rotation, Upd};
pub use locales::{LazyTable, LocaleMap, Locales};
pub use profile::{PmcProfile, ProfileTemplate};
pub use quest::Quest;
pub use template::ItemTemplate;
pub use trader::Trader;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing required table: {0}")]
    MissingTable(String),
}

#[derive(Debug, Default)]
pub struct Templates {
    pub items: IndexMap<String, ItemTemplate>,
    pub quests: IndexMap<String, Quest>,
    pub profiles: IndexMap<String, ProfileTemplate>,
}

impl Templates {
    /// Look up an item template, tolerating id case differences
    pub fn item(&self, id: &str) -> Option<&ItemTemplate> {
        self.items
            .get(id)
            .or_else(|| self.items.get(&id.to_ascii_lowercase()))
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut ItemTemplate> {
        if self.items.contains_key(id) {
            return self.items.get_mut(id);
        }
        self.items.get_mut(&id.to_ascii_lowercase())
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests
            .get(id)
            .or_else(|| self.quests.get(&id.to_ascii_lowercase()))
    }

    pub fn quest_mut(&mut self, id: &str) -> Option<&mut Quest> {
        if self.quests.contains_key(id) {
            return self.quests.get_mut(id);
        }
        self.quests.get_mut(&id.to_ascii_lowercase())
    }
}

#[derive(Debug, Default)]
pub struct Database {
    pub templates: Templates,
    pub traders: IndexMap<String, Trader>,
    pub globals: Globals,
    pub hideout: Hideout,
    pub bots: IndexMap<String, BotType>,
    pub locales: Locales,
    pub server: ServerConfigs,
}

impl Database {
    pub fn trader(&self, id: &str) -> Option<&Trader> {
        self.traders
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(_, t)| t)
    }

    pub fn trader_mut(&mut self, id: &str) -> Option<&mut Trader> {
        self.traders
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(_, t)| t)
    }

    /// Load every table from a data directory
    pub fn load_dir(root: &Path) -> Result<Self, DatabaseError> {
        let items_path = root.join("templates").join("items.json");
        if !items_path.is_file() {
            return Err(DatabaseError::MissingTable(items_path.display().to_string()));
        }

        let templates = Templates {
            items: read_json(&items_path)?,
            quests: read_optional(&root.join("templates").join("quests.json"))?,
            profiles: read_optional(&root.join("templates").join("profiles.json"))?,
        };

        let mut traders = IndexMap::new();
        for dir in sorted_entries(&root.join("traders"), |p| p.is_dir())? {
            let base_path = dir.join("base.json");
            if !base_path.is_file() {
                continue;
            }
            let trader = Trader {
                base: read_json(&base_path)?,
                assort: read_maybe(&dir.join("assort.json"))?,
                quest_assort: read_maybe(&dir.join("questassort.json"))?,
            };
            traders.insert(trader.base.id.clone(), trader);
        }

        let hideout = Hideout {
            areas: read_optional(&root.join("hideout").join("areas.json"))?,
            production: read_optional(&root.join("hideout").join("production.json"))?,
        };

        let mut bots = IndexMap::new();
        for file in sorted_entries(&root.join("bots").join("types"), is_json)? {
            if let Some(name) = file.file_stem().and_then(|s| s.to_str()) {
                bots.insert(name.to_string(), read_json(&file)?);
            }
        }

        let mut locales = Locales::default();
        for (dir, table) in [("global", &mut locales.global), ("server", &mut locales.server)] {
            for file in sorted_entries(&root.join("locales").join(dir), is_json)? {
                if let Some(lang) = file.file_stem().and_then(|s| s.to_str()) {
                    table.insert(lang.to_string(), LazyTable::new(read_json(&file)?));
                }
            }
        }

        let server = ServerConfigs {
            item: read_optional(&root.join("configs").join("item.json"))?,
            quest: read_optional(&root.join("configs").join("quest.json"))?,
        };

        debug!(
            items = templates.items.len(),
            quests = templates.quests.len(),
            traders = traders.len(),
            "database loaded"
        );

        Ok(Database {
            templates,
            traders,
            globals: read_optional(&root.join("globals.json"))?,
            hideout,
            bots,
            locales,
            server,
        })
    }

    /// Write every table back out in the same layout
    pub fn save_dir(&mut self, root: &Path) -> Result<(), DatabaseError> {
        let templates = root.join("templates");
        write_json(&templates.join("items.json"), &self.templates.items)?;
        write_json(&templates.join("quests.json"), &self.templates.quests)?;
        write_json(&templates.join("profiles.json"), &self.templates.profiles)?;

        for (id, trader) in &self.traders {
            let dir = root.join("traders").join(id);
            write_json(&dir.join("base.json"), &trader.base)?;
            if let Some(assort) = &trader.assort {
                write_json(&dir.join("assort.json"), assort)?;
            }
            if let Some(quest_assort) = &trader.quest_assort {
                write_json(&dir.join("questassort.json"), quest_assort)?;
            }
        }

        write_json(&root.join("globals.json"), &self.globals)?;
        write_json(&root.join("hideout").join("areas.json"), &self.hideout.areas)?;
        write_json(
            &root.join("hideout").join("production.json"),
            &self.hideout.production,
        )?;

        for (name, bot) in &self.bots {
            write_json(&root.join("bots").join("types").join(format!("{name}.json")), bot)?;
        }

        for (dir, table) in [("global", &mut self.locales.global), ("server", &mut self.locales.server)] {
            for (lang, locale) in table.iter_mut() {
                let path = root.join("locales").join(dir).join(format!("{lang}.json"));
                write_json(&path, &locale.snapshot())?;
            }
        }

        write_json(&root.join("configs").join("item.json"), &self.server.item)?;
        write_json(&root.join("configs").join("quest.json"), &self.server.quest)?;

        Ok(())
    }
}

// Internal helper functions

fn is_json(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn sorted_entries(dir: &Path, keep: fn(&Path) -> bool) -> Result<Vec<PathBuf>, DatabaseError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| DatabaseError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DatabaseError> {
    let data = fs::read(path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| DatabaseError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_maybe<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DatabaseError> {
    if !path.is_file() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DatabaseError> {
    Ok(read_maybe(path)?.unwrap_or_default())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DatabaseError> {
    let io_err = |source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|source| DatabaseError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(root: &Path, rel: &str, value: serde_json::Value) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_load_requires_items() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Database::load_dir(dir.path()),
            Err(DatabaseError::MissingTable(_))
        ));
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "templates/items.json",
            json!({ "5485a8684bdc2da71d8b4567": { "_id": "5485a8684bdc2da71d8b4567", "_name": "Ammo", "_parent": "", "_type": "Node", "_props": {} } }),
        );
        write(
            root,
            "traders/54cb50c76803fa8b248b4571/base.json",
            json!({ "_id": "54cb50c76803fa8b248b4571", "nickname": "Prapor" }),
        );
        write(root, "locales/global/en.json", json!({ "a Name": "Thing" }));
        write(root, "bots/types/assault.json", json!({ "inventory": { "items": { "Backpack": { "x": 3 } } } }));

        let mut db = Database::load_dir(root).unwrap();
        assert_eq!(db.templates.items.len(), 1);
        assert_eq!(db.trader("54CB50C76803FA8B248B4571").map(|t| t.nickname()), Some("Prapor"));
        assert_eq!(db.bots["assault"].inventory.items.backpack["x"], 3);
        assert!(db.templates.item("5485A8684BDC2DA71D8B4567").is_some());

        let out = tempfile::tempdir().unwrap();
        db.save_dir(out.path()).unwrap();
        let again = Database::load_dir(out.path()).unwrap();
        assert_eq!(again.templates.items, db.templates.items);
        assert_eq!(again.locales.global["en"].source()["a Name"], "Thing");
    }
}
