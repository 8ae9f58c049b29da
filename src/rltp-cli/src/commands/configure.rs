//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up rltp CLI defaults.

use crate::config::Config;
use anyhow::Result;

/// Handle the configure command
///
/// # Arguments
/// * `defaults` - Values to store; unset fields keep their current value
/// * `show` - If true, show current configuration
pub fn handle(defaults: Config, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    let changed = defaults.database_dir.is_some()
        || defaults.config_dir.is_some()
        || defaults.output_dir.is_some()
        || defaults.seed.is_some();
    if !changed {
        show_usage();
        return Ok(());
    }

    config.merge(defaults);
    config.save()?;
    println!("Configuration updated");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    let show_path = |label: &str, path: &Option<std::path::PathBuf>| match path {
        Some(path) => println!("{}: {}", label, path.display()),
        None => println!("{}: (not set)", label),
    };
    show_path("Database", &config.database_dir);
    show_path("Config", &config.config_dir);
    show_path("Output", &config.output_dir);
    match config.seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: (entropy)"),
    }
    println!("Debug flags: {:?}", config.debug_flags());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: rltp configure [--database DIR] [--config DIR] [--output DIR] [--default-seed N]");
    println!("       rltp configure --show");
}
