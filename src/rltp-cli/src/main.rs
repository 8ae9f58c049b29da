mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "rltp=debug,info" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Configure {
            database,
            config,
            output,
            default_seed,
            show,
        } => {
            let defaults = crate::config::Config {
                database_dir: database,
                config_dir: config,
                output_dir: output,
                seed: default_seed,
                debug: None,
            };
            commands::configure::handle(defaults, show)?;
        }

        Commands::Run {
            database,
            config,
            output,
            set,
        } => {
            let settings = commands::Settings::resolve(database, config, output)?;
            commands::run::handle(&settings, &set, cli.seed)?;
        }

        Commands::Route {
            url,
            request,
            response,
            profile,
            session,
            database,
            config,
            output,
            save,
        } => {
            let settings = commands::Settings::resolve(database, config, None)?;
            let replay = commands::route::Replay {
                url: &url,
                request: &request,
                response: &response,
                profile: &profile,
                session: &session,
            };
            commands::route::handle(&settings, &replay, output.as_deref(), save, cli.seed)?;
        }

        Commands::Ids { count, hash } => {
            commands::ids::handle(count, hash.as_deref(), cli.seed);
        }
    }

    Ok(())
}
