//! Locale overlay.
//!
//! Overrides are kept in two namespaces (global display strings and server
//! strings), each with an all-languages layer and per-language layers. A
//! transformer installed once per language stamps the layers onto the table
//! whenever the host materializes it; writes to an already resident table go
//! through immediately.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::db::{LazyTable, LocaleMap, Locales, Quest};

/// Language all lookups read from
pub const DEFAULT_LANGUAGE: &str = "en";

/// Quest fields holding locale keys
pub const QUEST_LOCALE_FIELDS: [&str; 10] = [
    "name",
    "description",
    "note",
    "startedMessageText",
    "acceptPlayerMessage",
    "declinePlayerMessage",
    "successMessageText",
    "failMessageText",
    "changeQuestMessageText",
    "completePlayerMessage",
];

/// Sentinel for a missing display string
pub fn unknown_locale(key: &str) -> String {
    format!("UNKNOWN LOCALE ID {key}")
}

#[derive(Debug, Default)]
struct Layers {
    all: LocaleMap,
    by_lang: IndexMap<String, LocaleMap>,
}

impl Layers {
    fn apply(&self, lang: &str, table: &mut LocaleMap) {
        for (key, value) in &self.all {
            table.insert(key.clone(), value.clone());
        }
        if let Some(per_lang) = self
            .by_lang
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(lang))
            .map(|(_, m)| m)
        {
            for (key, value) in per_lang {
                table.insert(key.clone(), value.clone());
            }
        }
    }

    fn lang_mut(&mut self, lang: &str) -> &mut LocaleMap {
        let key = lang.to_ascii_lowercase();
        self.by_lang.entry(key).or_default()
    }
}

#[derive(Debug, Default)]
struct Namespace {
    layers: Rc<RefCell<Layers>>,
    hooked: HashSet<String>,
}

impl Namespace {
    fn ensure(&mut self, tables: &mut IndexMap<String, LazyTable>) {
        for (lang, table) in tables.iter_mut() {
            if !self.hooked.insert(lang.to_ascii_lowercase()) {
                continue;
            }
            let layers = Rc::clone(&self.layers);
            let captured = lang.clone();
            table.add_transformer(Box::new(move |data| layers.borrow().apply(&captured, data)));
            debug!(language = %lang, "locale transformer installed");
        }
    }
}

/// Override layers for both locale namespaces.
#[derive(Debug, Default)]
pub struct LocaleOverlay {
    global: Namespace,
    server: Namespace,
}

impl LocaleOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override a display string in every language
    pub fn set_global_all(&mut self, locales: &mut Locales, key: &str, value: &str) {
        self.global
            .layers
            .borrow_mut()
            .all
            .insert(key.to_string(), value.to_string());
        for table in locales.global.values_mut() {
            if let Some(resident) = table.resident_mut() {
                resident.insert(key.to_string(), value.to_string());
            }
        }
        self.global.ensure(&mut locales.global);
    }

    /// Override a display string in one language
    pub fn set_global_only(&mut self, locales: &mut Locales, lang: &str, key: &str, value: &str) {
        self.global
            .layers
            .borrow_mut()
            .lang_mut(lang)
            .insert(key.to_string(), value.to_string());
        if let Some(resident) = find_table(&mut locales.global, lang).and_then(LazyTable::resident_mut) {
            resident.insert(key.to_string(), value.to_string());
        }
        self.global.ensure(&mut locales.global);
    }

    /// Override a server string in every language
    pub fn set_server_all(&mut self, locales: &mut Locales, key: &str, value: &str) {
        self.server
            .layers
            .borrow_mut()
            .all
            .insert(key.to_string(), value.to_string());
        for table in locales.server.values_mut() {
            if let Some(resident) = table.resident_mut() {
                resident.insert(key.to_string(), value.to_string());
            }
        }
        self.server.ensure(&mut locales.server);
    }

    /// Override a key in both namespaces
    pub fn set_all(&mut self, locales: &mut Locales, key: &str, value: &str) {
        self.set_global_all(locales, key, value);
        self.set_server_all(locales, key, value);
    }

    /// Seed per-language display overrides, e.g. from a `languages` section
    pub fn seed_languages(&mut self, locales: &mut Locales, languages: &IndexMap<String, LocaleMap>) {
        for (lang, entries) in languages {
            let mut layers = self.global.layers.borrow_mut();
            let target = layers.lang_mut(lang);
            for (key, value) in entries {
                target.insert(key.clone(), value.clone());
            }
        }
        self.ensure_transformers(locales);
    }

    /// Install the per-language transformers for any language not yet hooked
    pub fn ensure_transformers(&mut self, locales: &mut Locales) {
        self.global.ensure(&mut locales.global);
        self.server.ensure(&mut locales.server);
    }

    /// Non-empty English display string
    pub fn try_get_en(&mut self, locales: &mut Locales, key: &str) -> Option<String> {
        self.global.ensure(&mut locales.global);
        let table = find_table(&mut locales.global, DEFAULT_LANGUAGE)?;
        table.get(key).filter(|v| !v.is_empty()).cloned()
    }

    /// English display string, or the unknown-locale sentinel
    pub fn get_en(&mut self, locales: &mut Locales, key: &str) -> String {
        self.try_get_en(locales, key)
            .unwrap_or_else(|| unknown_locale(key))
    }

    /// Copy quest locale keys between namespaces where one side lacks them.
    ///
    /// Only languages present in both namespaces are touched.
    pub fn sync_quest_locales<'a>(
        &mut self,
        locales: &mut Locales,
        quests: impl IntoIterator<Item = &'a Quest>,
    ) {
        self.ensure_transformers(locales);
        let keys: Vec<String> = quests
            .into_iter()
            .flat_map(|quest| QUEST_LOCALE_FIELDS.iter().filter_map(move |f| quest.locale_key(f)))
            .map(str::to_string)
            .collect();
        if keys.is_empty() {
            return;
        }

        for lang in locales.shared_languages() {
            let (Some(global), Some(server)) =
                (locales.global.get_mut(&lang), locales.server.get_mut(&lang))
            else {
                continue;
            };
            let global = global.materialize();
            let server = server.materialize();
            for key in &keys {
                if !global.contains_key(key) {
                    if let Some(value) = server.get(key) {
                        global.insert(key.clone(), value.clone());
                    }
                } else if !server.contains_key(key) {
                    if let Some(value) = global.get(key) {
                        server.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }
}

// Internal helper functions

fn find_table<'a>(tables: &'a mut IndexMap<String, LazyTable>, lang: &str) -> Option<&'a mut LazyTable> {
    tables
        .iter_mut()
        .find(|(l, _)| l.eq_ignore_ascii_case(lang))
        .map(|(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locales() -> Locales {
        let mut locales = Locales::default();
        for lang in ["en", "fr"] {
            let mut map = LocaleMap::new();
            map.insert("a".into(), format!("{lang}-a"));
            locales.global.insert(lang.into(), LazyTable::new(map.clone()));
            locales.server.insert(lang.into(), LazyTable::new(map));
        }
        locales
    }

    #[test]
    fn test_language_override_wins() {
        let mut l = locales();
        let mut overlay = LocaleOverlay::new();
        overlay.set_global_all(&mut l, "a", "all");
        overlay.set_global_only(&mut l, "en", "a", "english");

        assert_eq!(l.global["en"].get("a").map(String::as_str), Some("english"));
        assert_eq!(l.global["fr"].get("a").map(String::as_str), Some("all"));
        assert_eq!(l.global["en"].transformer_count(), 1);
    }

    #[test]
    fn test_write_through_to_resident_table() {
        let mut l = locales();
        let mut overlay = LocaleOverlay::new();
        assert_eq!(overlay.get_en(&mut l, "a"), "en-a");
        overlay.set_global_all(&mut l, "b", "bee");
        assert!(l.global["en"].is_resident());
        assert_eq!(overlay.get_en(&mut l, "b"), "bee");

        l.global["en"].invalidate();
        assert_eq!(overlay.get_en(&mut l, "b"), "bee");
    }

    #[test]
    fn test_unknown_sentinel() {
        let mut l = locales();
        let mut overlay = LocaleOverlay::new();
        assert_eq!(overlay.get_en(&mut l, "missing"), "UNKNOWN LOCALE ID missing");
        overlay.set_global_all(&mut l, "empty", "");
        assert_eq!(overlay.try_get_en(&mut l, "empty"), None);
    }

    #[test]
    fn test_server_namespace_is_separate() {
        let mut l = locales();
        let mut overlay = LocaleOverlay::new();
        overlay.set_server_all(&mut l, "mail", "hello");
        assert_eq!(l.server["fr"].get("mail").map(String::as_str), Some("hello"));
        assert!(l.global["fr"].get("mail").is_none());
    }

    #[test]
    fn test_seed_languages() {
        let mut l = locales();
        let mut overlay = LocaleOverlay::new();
        let mut fr = LocaleMap::new();
        fr.insert("a".into(), "bonjour".into());
        let mut langs = IndexMap::new();
        langs.insert("FR".to_string(), fr);
        overlay.seed_languages(&mut l, &langs);
        assert_eq!(l.global["fr"].get("a").map(String::as_str), Some("bonjour"));
        assert_eq!(l.global["en"].get("a").map(String::as_str), Some("en-a"));
    }

    #[test]
    fn test_sync_quest_locales() {
        let mut overlay = LocaleOverlay::new();
        let quest: Quest = serde_json::from_value(json!({
            "_id": "q", "name": "q name", "description": "q description"
        }))
        .unwrap();
        let mut l2 = Locales::default();
        let mut g = LocaleMap::new();
        g.insert("q description".into(), "Desc".into());
        let mut s = LocaleMap::new();
        s.insert("q name".into(), "Quest".into());
        l2.global.insert("en".into(), LazyTable::new(g));
        l2.server.insert("en".into(), LazyTable::new(s));

        overlay.sync_quest_locales(&mut l2, [&quest]);
        assert_eq!(l2.global["en"].get("q name").map(String::as_str), Some("Quest"));
        assert_eq!(l2.server["en"].get("q description").map(String::as_str), Some("Desc"));
    }
}
