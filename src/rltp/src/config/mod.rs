//! Configuration documents.
//!
//! Each content manager owns one document, loaded by name from a
//! [`ConfigSource`]. Documents are kept as a raw tree so that operators can
//! query and override arbitrary paths, and are projected into typed,
//! lenient per-manager structs before use.

pub mod lenient;
mod source;

pub use source::{ConfigSource, DirConfigSource, MemoryConfigSource};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Array index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    #[error("Invalid array index: {0}")]
    InvalidIndex(String),
}

/// A loosely typed configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    data: Value,
}

impl ConfigTree {
    pub fn new(data: Value) -> Self {
        ConfigTree { data }
    }

    /// An absent document. Every projection of it yields defaults.
    pub fn empty() -> Self {
        ConfigTree { data: Value::Null }
    }

    /// Parse a JSON document
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(ConfigTree {
            data: serde_json::from_slice(data)?,
        })
    }

    /// Parse a YAML document
    pub fn from_yaml(data: &[u8]) -> Result<Self, ConfigError> {
        Ok(ConfigTree {
            data: serde_yaml::from_slice(data)?,
        })
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    pub fn value(&self) -> &Value {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Query a value at a dotted path (e.g. "items.ak.changes" or "bots.assault.lootMultipliers\[0\]")
    pub fn get(&self, path: &str) -> Result<&Value, ConfigError> {
        query_path(&self.data, path)
    }

    /// Set a value at a dotted path, creating missing object keys along the way
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        if self.data.is_null() {
            self.data = Value::Object(Map::new());
        }
        set_path(&mut self.data, path, value, true)
    }

    /// Parse a string value into the appropriate JSON type (number, bool, or string)
    pub fn parse_value(value_str: &str) -> Value {
        parse_value(value_str)
    }

    /// Set a value given as an inline YAML/JSON document
    pub fn set_raw(&mut self, path: &str, yaml_str: &str) -> Result<(), ConfigError> {
        let value: Value = serde_yaml::from_str(yaml_str)?;
        self.set(path, value)
    }

    /// Project the document into a typed config.
    ///
    /// A document that does not match the shape of `T` at all is logged and
    /// treated as absent. Field-level leniency is the job of `T` itself.
    pub fn project<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        if self.data.is_null() {
            return T::default();
        }
        match T::deserialize(&self.data) {
            Ok(config) => config,
            Err(e) => {
                error!(config = name, error = %e, "malformed config, using defaults");
                T::default()
            }
        }
    }
}

/// Load a named document, falling back to an empty tree.
///
/// A missing document is a warning, an unreadable one an error; neither stops
/// the caller.
pub fn load_or_empty(source: &dyn ConfigSource, name: &str) -> ConfigTree {
    match source.load(name) {
        Ok(Some(tree)) => tree,
        Ok(None) => {
            warn!(config = name, "config not found");
            ConfigTree::empty()
        }
        Err(e) => {
            error!(config = name, error = %e, "failed to load config");
            ConfigTree::empty()
        }
    }
}

// Internal helper functions

fn split_index(part: &str) -> Result<(&str, Option<usize>), ConfigError> {
    let Some(bracket_pos) = part.find('[') else {
        return Ok((part, None));
    };
    let key = &part[..bracket_pos];
    let index_str = part[bracket_pos + 1..].trim_end_matches(']');
    let index: usize = index_str
        .parse()
        .map_err(|_| ConfigError::InvalidIndex(index_str.to_string()))?;
    Ok((key, Some(index)))
}

pub(crate) fn query_path<'a>(value: &'a Value, path: &str) -> Result<&'a Value, ConfigError> {
    let mut current = value;

    for part in path.split('.') {
        let (key, index) = split_index(part)?;

        current = current
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        if let Some(index) = index {
            current = current
                .get(index)
                .ok_or(ConfigError::IndexOutOfBounds(index))?;
        }
    }

    Ok(current)
}

pub(crate) fn set_path(
    value: &mut Value,
    path: &str,
    new_value: Value,
    create: bool,
) -> Result<(), ConfigError> {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = value;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        let (key, index) = split_index(part)?;

        if create && index.is_none() {
            if let Value::Object(map) = current {
                if !map.contains_key(key) {
                    let fill = if is_last {
                        Value::Null
                    } else {
                        Value::Object(Map::new())
                    };
                    map.insert(key.to_string(), fill);
                }
            }
        }

        current = current
            .get_mut(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        if let Some(index) = index {
            current = current
                .get_mut(index)
                .ok_or(ConfigError::IndexOutOfBounds(index))?;
        }

        if is_last {
            *current = new_value;
            return Ok(());
        }
    }

    Ok(())
}

fn parse_value(value_str: &str) -> Value {
    // Try to parse as number first
    if let Ok(num) = value_str.parse::<i64>() {
        return Value::Number(num.into());
    }
    if let Ok(num) = value_str.parse::<u64>() {
        return Value::Number(num.into());
    }
    if let Ok(num) = value_str.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(num) {
            return Value::Number(n);
        }
    }

    // Try boolean
    if value_str.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value_str.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    // Default to string
    Value::String(value_str.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn test_tree() -> ConfigTree {
        ConfigTree::new(json!({
            "enabled": true,
            "items": {
                "ak": { "copyTemplateId": "5ac66d2e5acfc43b321d4b53", "count": 3 }
            },
            "bots": [
                { "name": "assault", "multiplier": 1.5 },
                { "name": "marksman", "multiplier": 2 }
            ]
        }))
    }

    #[test]
    fn test_get_nested() {
        let tree = test_tree();
        assert_eq!(tree.get("items.ak.count").unwrap(), &json!(3));
        assert_eq!(tree.get("bots[1].name").unwrap(), &json!("marksman"));
    }

    #[test]
    fn test_get_errors() {
        let tree = test_tree();
        assert!(matches!(
            tree.get("items.m4"),
            Err(ConfigError::KeyNotFound(k)) if k == "m4"
        ));
        assert!(matches!(
            tree.get("bots[5]"),
            Err(ConfigError::IndexOutOfBounds(5))
        ));
        assert!(matches!(
            tree.get("bots[x]"),
            Err(ConfigError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_set_existing_and_new_keys() {
        let mut tree = test_tree();
        tree.set("items.ak.count", json!(7)).unwrap();
        tree.set("bots[0].multiplier", json!(3)).unwrap();
        tree.set("traders.prapor.enabled", json!(false)).unwrap();

        assert_eq!(tree.get("items.ak.count").unwrap(), &json!(7));
        assert_eq!(tree.get("bots[0].multiplier").unwrap(), &json!(3));
        assert_eq!(tree.get("traders.prapor.enabled").unwrap(), &json!(false));
    }

    #[test]
    fn test_set_on_empty_tree() {
        let mut tree = ConfigTree::empty();
        assert!(tree.is_empty());
        tree.set("enabled", json!(true)).unwrap();
        assert!(!tree.is_empty());
        assert_eq!(tree.get("enabled").unwrap(), &json!(true));
    }

    #[test]
    fn test_set_raw() {
        let mut tree = test_tree();
        tree.set_raw("items.ak.changes", "{ _props: { Weight: 2 } }")
            .unwrap();
        assert_eq!(tree.get("items.ak.changes._props.Weight").unwrap(), &json!(2));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(ConfigTree::parse_value("42"), json!(42));
        assert_eq!(ConfigTree::parse_value("-1"), json!(-1));
        assert_eq!(ConfigTree::parse_value("1.5"), json!(1.5));
        assert_eq!(ConfigTree::parse_value("TRUE"), json!(true));
        assert_eq!(ConfigTree::parse_value("false"), json!(false));
        assert_eq!(ConfigTree::parse_value("prapor"), json!("prapor"));
    }

    #[test]
    fn test_from_yaml() {
        let tree = ConfigTree::from_yaml(b"enabled: true\nitems:\n  a: 1\n").unwrap();
        assert_eq!(tree.get("items.a").unwrap(), &json!(1));
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        enabled: bool,
    }

    #[test]
    fn test_project_malformed_is_default() {
        let tree = ConfigTree::new(json!([1, 2, 3]));
        let sample: Sample = tree.project("Sample");
        assert!(!sample.enabled);

        let tree = ConfigTree::new(json!({ "enabled": true }));
        let sample: Sample = tree.project("Sample");
        assert!(sample.enabled);
    }
}
