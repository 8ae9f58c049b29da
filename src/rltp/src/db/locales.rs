//! Lazily materialized locale tables.
//!
//! The host keeps each language as a loaded source table and only builds the
//! resident copy when something reads it. Transformers registered on a table
//! run, in order, every time it is (re)materialized.

use std::fmt;

use indexmap::IndexMap;

pub type LocaleMap = IndexMap<String, String>;
pub type Transformer = Box<dyn Fn(&mut LocaleMap)>;

pub struct LazyTable {
    source: LocaleMap,
    resident: Option<LocaleMap>,
    transformers: Vec<Transformer>,
}

impl LazyTable {
    pub fn new(source: LocaleMap) -> Self {
        LazyTable {
            source,
            resident: None,
            transformers: Vec::new(),
        }
    }

    pub fn source(&self) -> &LocaleMap {
        &self.source
    }

    pub fn is_resident(&self) -> bool {
        self.resident.is_some()
    }

    pub fn transformer_count(&self) -> usize {
        self.transformers.len()
    }

    /// Register a transformer for future materializations.
    ///
    /// An already resident copy is left as is.
    pub fn add_transformer(&mut self, transformer: Transformer) {
        self.transformers.push(transformer);
    }

    /// Build the resident copy if needed and return it
    pub fn materialize(&mut self) -> &mut LocaleMap {
        let transformers = &self.transformers;
        let source = &self.source;
        self.resident.get_or_insert_with(|| {
            let mut table = source.clone();
            for transform in transformers {
                transform(&mut table);
            }
            table
        })
    }

    pub fn resident_mut(&mut self) -> Option<&mut LocaleMap> {
        self.resident.as_mut()
    }

    /// Drop the resident copy; the next read rebuilds it
    pub fn invalidate(&mut self) {
        self.resident = None;
    }

    pub fn get(&mut self, key: &str) -> Option<&String> {
        self.materialize().get(key)
    }

    /// Materialized contents, for persisting
    pub fn snapshot(&mut self) -> LocaleMap {
        self.materialize().clone()
    }
}

impl fmt::Debug for LazyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTable")
            .field("entries", &self.source.len())
            .field("resident", &self.resident.is_some())
            .field("transformers", &self.transformers.len())
            .finish()
    }
}

/// Both locale namespaces, keyed by language code.
#[derive(Debug, Default)]
pub struct Locales {
    /// Player-facing display strings
    pub global: IndexMap<String, LazyTable>,
    /// Server-internal strings (mail texts, etc.)
    pub server: IndexMap<String, LazyTable>,
}

impl Locales {
    /// Languages present in both namespaces
    pub fn shared_languages(&self) -> Vec<String> {
        self.global
            .keys()
            .filter(|lang| self.server.contains_key(*lang))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> LocaleMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_materialize_applies_transformers_in_order() {
        let mut t = LazyTable::new(table(&[("a", "1")]));
        t.add_transformer(Box::new(|m| {
            m.insert("a".into(), "2".into());
        }));
        t.add_transformer(Box::new(|m| {
            let next = format!("{}!", m["a"]);
            m.insert("a".into(), next);
        }));
        assert!(!t.is_resident());
        assert_eq!(t.get("a").map(String::as_str), Some("2!"));
        assert!(t.is_resident());
        assert_eq!(t.source()["a"], "1");
    }

    #[test]
    fn test_transformer_added_late_waits_for_rematerialize() {
        let mut t = LazyTable::new(table(&[("a", "1")]));
        t.materialize();
        t.add_transformer(Box::new(|m| {
            m.insert("b".into(), "x".into());
        }));
        assert!(t.get("b").is_none());
        t.invalidate();
        assert_eq!(t.get("b").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_shared_languages() {
        let mut locales = Locales::default();
        locales.global.insert("en".into(), LazyTable::new(LocaleMap::new()));
        locales.global.insert("fr".into(), LazyTable::new(LocaleMap::new()));
        locales.server.insert("en".into(), LazyTable::new(LocaleMap::new()));
        assert_eq!(locales.shared_languages(), vec!["en"]);
    }
}
