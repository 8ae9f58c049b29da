//! Route command: replay a captured request against a profile file

use anyhow::{bail, Context as _, Result};
use rltp::{DirConfigSource, FileProfileStore, ProfileStore, Route};
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::{start_pipeline, Settings};

/// A captured exchange
pub struct Replay<'a> {
    pub url: &'a str,
    pub request: &'a Path,
    pub response: &'a Path,
    pub profile: &'a Path,
    pub session: &'a str,
}

/// Handle the route command
pub fn handle(
    settings: &Settings,
    replay: &Replay<'_>,
    output: Option<&Path>,
    save: bool,
    seed: Option<u64>,
) -> Result<()> {
    let Some(route) = Route::from_url(replay.url) else {
        bail!("No interceptor for route '{}'", replay.url);
    };

    let request: Value = serde_json::from_slice(
        &fs::read(replay.request)
            .with_context(|| format!("Failed to read request {}", replay.request.display()))?,
    )
    .with_context(|| format!("Failed to parse request {}", replay.request.display()))?;
    let response = fs::read_to_string(replay.response)
        .with_context(|| format!("Failed to read response {}", replay.response.display()))?;
    let mut store = FileProfileStore::open(replay.profile, replay.session)
        .with_context(|| format!("Failed to open profile {}", replay.profile.display()))?;

    let source = DirConfigSource::new(&settings.config);
    let mut rltp = start_pipeline(settings, Box::new(source), seed)?;
    let result = rltp.handle(route.url(), &request, replay.session, &mut store, response);

    if save {
        store
            .save(replay.session)
            .with_context(|| format!("Failed to save profile {}", replay.profile.display()))?;
    }

    match output {
        Some(path) => {
            fs::write(path, &result)
                .with_context(|| format!("Failed to write response to {}", path.display()))?;
            println!("Response written to {}", path.display());
        }
        None => println!("{}", result),
    }

    Ok(())
}
