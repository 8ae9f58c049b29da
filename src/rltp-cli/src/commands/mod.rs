//! Command handlers

pub mod configure;
pub mod ids;
pub mod route;
pub mod run;

use anyhow::{bail, Context as _, Result};
use rltp::{ConfigSource, Context, Database, DebugFlags, Rltp};
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;

/// Directories and defaults for one command, flags over the config file
#[derive(Debug)]
pub struct Settings {
    pub database: PathBuf,
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
    pub debug: DebugFlags,
}

impl Settings {
    pub fn resolve(
        database: Option<PathBuf>,
        config: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        let mut settings = Config::load()?;
        settings.merge(Config {
            database_dir: database,
            config_dir: config,
            output_dir: output,
            ..Default::default()
        });
        let debug = settings.debug_flags();

        let Some(database) = settings.database_dir else {
            bail!("No database directory. Pass --database or run: rltp configure --database DIR");
        };
        let Some(config) = settings.config_dir else {
            bail!("No config directory. Pass --config or run: rltp configure --config DIR");
        };

        Ok(Settings {
            database,
            config,
            output: settings.output_dir,
            seed: settings.seed,
            debug,
        })
    }
}

/// Load the database and run every lifecycle phase over it
pub fn start_pipeline(settings: &Settings, source: Box<dyn ConfigSource>, seed: Option<u64>) -> Result<Rltp> {
    let db = Database::load_dir(&settings.database)
        .with_context(|| format!("Failed to load database from {}", settings.database.display()))?;
    let seed = seed.or(settings.seed);
    info!(database = %settings.database.display(), config = %settings.config.display(), ?seed, "starting pipeline");

    let mut rltp = Rltp::new(source, db, Context::new(settings.debug.clone(), seed));
    rltp.post_startup();
    Ok(rltp)
}
