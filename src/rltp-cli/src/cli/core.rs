//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rltp")]
#[command(about = "Rogue-lite content pipeline", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Seed for every random roll (uses configured default, else entropy)
    #[arg(long, global = true, env = "RLTP_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every lifecycle phase over a database and write the result
    #[command(visible_alias = "r")]
    Run {
        /// Database directory (uses configured default if not provided)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory with the manager config documents
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the rewritten database
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override a config value before loading, as Document:path=value
        /// (e.g. "TradersConfig:enabled=false")
        #[arg(long = "set", value_name = "DOC:PATH=VALUE")]
        set: Vec<String>,
    },

    /// Replay a captured request through its interceptor
    Route {
        /// Route url, e.g. /client/match/local/end
        url: String,

        /// Request body (JSON)
        #[arg(long)]
        request: PathBuf,

        /// Response body the host produced
        #[arg(long)]
        response: PathBuf,

        /// Profile file: a bare PMC profile or a full save
        #[arg(long)]
        profile: PathBuf,

        /// Session id the profile belongs to
        #[arg(long, default_value = "local")]
        session: String,

        /// Database directory (uses configured default if not provided)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory with the manager config documents
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the rewritten response here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the profile afterwards even if the interceptor did not
        #[arg(long)]
        save: bool,
    },

    /// Print fresh identifiers
    Ids {
        /// How many to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Print the identifier derived from this text instead
        #[arg(long)]
        hash: Option<String>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default database directory
        #[arg(long)]
        database: Option<PathBuf>,

        /// Set default config directory
        #[arg(long)]
        config: Option<PathBuf>,

        /// Set default output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Set default seed
        #[arg(long = "default-seed", value_name = "SEED")]
        default_seed: Option<u64>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
