//! Run command: rewrite a database directory

use anyhow::{bail, Context as _, Result};
use rltp::{ConfigError, ConfigSource, ConfigTree, DirConfigSource};

use super::{start_pipeline, Settings};

/// One `Document:path=value` override
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub document: String,
    pub path: String,
    pub value: String,
}

impl Override {
    pub fn parse(text: &str) -> Result<Self> {
        let Some((document, rest)) = text.split_once(':') else {
            bail!("Invalid override '{}': expected Document:path=value", text);
        };
        let Some((path, value)) = rest.split_once('=') else {
            bail!("Invalid override '{}': expected Document:path=value", text);
        };
        if document.trim().is_empty() || path.trim().is_empty() {
            bail!("Invalid override '{}': document and path must not be empty", text);
        }
        Ok(Override {
            document: document.trim().to_string(),
            path: path.trim().to_string(),
            value: value.to_string(),
        })
    }
}

/// Documents from a directory with operator overrides applied on load
pub struct OverrideSource<S> {
    inner: S,
    overrides: Vec<Override>,
}

impl<S: ConfigSource> OverrideSource<S> {
    pub fn new(inner: S, overrides: Vec<Override>) -> Self {
        OverrideSource { inner, overrides }
    }
}

impl<S: ConfigSource> ConfigSource for OverrideSource<S> {
    fn load(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        let mut tree = self.inner.load(name)?;
        for entry in self.overrides.iter().filter(|o| o.document == name) {
            tree.get_or_insert_with(ConfigTree::empty)
                .set(&entry.path, ConfigTree::parse_value(&entry.value))?;
        }
        Ok(tree)
    }

    fn load_trader(&self, name: &str) -> Result<Option<ConfigTree>, ConfigError> {
        self.inner.load_trader(name)
    }
}

/// Handle the run command
pub fn handle(settings: &Settings, set: &[String], seed: Option<u64>) -> Result<()> {
    let Some(output) = settings.output.as_ref() else {
        bail!("No output directory. Pass --output or run: rltp configure --output DIR");
    };
    let overrides = set.iter().map(|s| Override::parse(s)).collect::<Result<Vec<_>>>()?;
    let source = OverrideSource::new(DirConfigSource::new(&settings.config), overrides);

    let mut rltp = start_pipeline(settings, Box::new(source), seed)?;
    rltp.database_mut()
        .save_dir(output)
        .with_context(|| format!("Failed to write database to {}", output.display()))?;

    println!("Database written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rltp::MemoryConfigSource;
    use serde_json::json;

    #[test]
    fn test_parse_override() {
        let parsed = Override::parse("TradersConfig:traders[0].enabled=false").unwrap();
        assert_eq!(parsed.document, "TradersConfig");
        assert_eq!(parsed.path, "traders[0].enabled");
        assert_eq!(parsed.value, "false");

        assert!(Override::parse("no-colon=1").is_err());
        assert!(Override::parse("Doc:no-equals").is_err());
        assert!(Override::parse(":path=1").is_err());
    }

    #[test]
    fn test_override_source_applies_values() {
        let inner = MemoryConfigSource::new().with("WipeConfig", json!({ "enabled": false }));
        let source = OverrideSource::new(
            inner,
            vec![
                Override::parse("WipeConfig:enabled=true").unwrap(),
                Override::parse("StartConfig:enabled=true").unwrap(),
            ],
        );

        let wipe = source.load("WipeConfig").unwrap().unwrap();
        assert_eq!(wipe.get("enabled").unwrap(), &json!(true));
        let start = source.load("StartConfig").unwrap().unwrap();
        assert_eq!(start.get("enabled").unwrap(), &json!(true));
        assert!(source.load("DeathConfig").unwrap().is_none());
    }
}
