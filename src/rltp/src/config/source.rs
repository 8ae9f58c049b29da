use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{ConfigError, ConfigTree};

/// Where configuration documents come from.
///
/// `Ok(None)` means the document does not exist, which callers treat as an
/// empty document.
pub trait ConfigSource {
    /// Load a per-manager document by name (e.g. "TradersConfig")
    fn load(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError>;

    /// Load a nested per-trader document by name
    fn load_trader(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError>;
}

/// Documents on disk: `<root>/<Name>.json` (or `.yaml`/`.yml`) and
/// `<root>/Traders/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirConfigSource {
    root: PathBuf,
}

impl DirConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirConfigSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(dir: &Path, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        let json = dir.join(format!("{name}.json"));
        if json.is_file() {
            return ConfigTree::from_json(&fs::read(json)?).map(Some);
        }

        for ext in ["yaml", "yml"] {
            let yaml = dir.join(format!("{name}.{ext}"));
            if yaml.is_file() {
                return ConfigTree::from_yaml(&fs::read(yaml)?).map(Some);
            }
        }

        Ok(None)
    }
}

impl ConfigSource for DirConfigSource {
    fn load(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        Self::read(&self.root, name)
    }

    fn load_trader(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        Self::read(&self.root.join("Traders"), name)
    }
}

/// In-memory documents, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    documents: HashMap<String, ConfigTree>,
    traders: HashMap<String, ConfigTree>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.documents
            .insert(name.to_string(), ConfigTree::new(value));
        self
    }

    pub fn with_trader(mut self, name: &str, value: Value) -> Self {
        self.traders.insert(name.to_string(), ConfigTree::new(value));
        self
    }

    /// Mutable access to a document, for path overrides
    pub fn document_mut(&mut self, name: &str) -> &mut ConfigTree {
        self.documents.entry(name.to_string()).or_default()
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        Ok(self.documents.get(name).cloned())
    }

    fn load_trader(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        Ok(self.traders.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dir_source_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("GlobalsConfig.json"), br#"{"enabled": true}"#).unwrap();
        fs::write(dir.path().join("BotsConfig.yaml"), b"enabled: false\n").unwrap();
        fs::create_dir(dir.path().join("Traders")).unwrap();
        fs::write(
            dir.path().join("Traders").join("prapor.json"),
            br#"{"traderId": "54cb50c76803fa8b248b4571"}"#,
        )
        .unwrap();

        let source = DirConfigSource::new(dir.path());
        let globals = source.load("GlobalsConfig").unwrap().unwrap();
        assert_eq!(globals.get("enabled").unwrap(), &json!(true));

        let bots = source.load("BotsConfig").unwrap().unwrap();
        assert_eq!(bots.get("enabled").unwrap(), &json!(false));

        assert!(source.load("QuestsConfig").unwrap().is_none());

        let prapor = source.load_trader("prapor").unwrap().unwrap();
        assert_eq!(
            prapor.get("traderId").unwrap(),
            &json!("54cb50c76803fa8b248b4571")
        );
    }

    #[test]
    fn test_dir_source_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ItemsConfig.json"), b"{ not json").unwrap();
        let source = DirConfigSource::new(dir.path());
        assert!(matches!(
            source.load("ItemsConfig"),
            Err(ConfigError::JsonParse(_))
        ));
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemoryConfigSource::new()
            .with("WipeConfig", json!({ "enabled": true }))
            .with_trader("skier", json!({ "enabled": false }));
        source
            .document_mut("WipeConfig")
            .set("securedItems", json!(["a"]))
            .unwrap();

        let wipe = source.load("WipeConfig").unwrap().unwrap();
        assert_eq!(wipe.get("securedItems[0]").unwrap(), &json!("a"));
        assert!(source.load_trader("skier").unwrap().is_some());
        assert!(source.load_trader("prapor").unwrap().is_none());
    }
}
