//! Live profile access.
//!
//! Route handlers resolve the player's profile by session id and ask for it
//! to be persisted once they are done mutating it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::backup::{self, BackupError};
use crate::db::PmcProfile;

#[derive(Error, Debug)]
pub enum ProfileStoreError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
}

/// Resolves and persists PMC profiles by session id.
pub trait ProfileStore {
    fn profile_mut(&mut self, session_id: &str) -> Option<&mut PmcProfile>;

    fn save(&mut self, session_id: &str) -> Result<(), ProfileStoreError>;
}

/// The player a request runs for, with access to their profile.
pub struct Session<'a> {
    pub id: &'a str,
    pub store: &'a mut dyn ProfileStore,
}

impl<'a> Session<'a> {
    pub fn new(id: &'a str, store: &'a mut dyn ProfileStore) -> Self {
        Session { id, store }
    }

    pub fn profile_mut(&mut self) -> Option<&mut PmcProfile> {
        self.store.profile_mut(self.id)
    }

    /// Persist the profile. A failed save is logged, never propagated.
    pub fn save(&mut self) -> bool {
        match self.store.save(self.id) {
            Ok(()) => true,
            Err(e) => {
                error!(session = self.id, error = %e, "failed to save profile");
                false
            }
        }
    }
}

/// Profiles held in memory. Saves are only counted.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<String, PmcProfile>,
    saves: Vec<String>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, session_id: &str, profile: PmcProfile) -> Self {
        self.insert(session_id, profile);
        self
    }

    pub fn insert(&mut self, session_id: &str, profile: PmcProfile) {
        self.profiles.insert(session_id.to_string(), profile);
    }

    pub fn profile(&self, session_id: &str) -> Option<&PmcProfile> {
        self.profiles.get(session_id)
    }

    /// Session ids in the order they were saved
    pub fn saves(&self) -> &[String] {
        &self.saves
    }
}

impl ProfileStore for MemoryProfileStore {
    fn profile_mut(&mut self, session_id: &str) -> Option<&mut PmcProfile> {
        self.profiles.get_mut(session_id)
    }

    fn save(&mut self, session_id: &str) -> Result<(), ProfileStoreError> {
        if !self.profiles.contains_key(session_id) {
            return Err(ProfileStoreError::UnknownSession(session_id.to_string()));
        }
        self.saves.push(session_id.to_string());
        Ok(())
    }
}

/// A single profile document on disk.
///
/// The file holds either a bare PMC profile or a full save with the PMC
/// under `characters.pmc`; the rest of a full save is written back as read.
#[derive(Debug)]
pub struct FileProfileStore {
    path: PathBuf,
    session_id: String,
    document: Value,
    nested: bool,
    profile: PmcProfile,
}

impl FileProfileStore {
    pub fn open(path: &Path, session_id: &str) -> Result<Self, ProfileStoreError> {
        let data = fs::read(path).map_err(|source| ProfileStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json_err = |source| ProfileStoreError::Json {
            path: path.to_path_buf(),
            source,
        };
        let document: Value = serde_json::from_slice(&data).map_err(json_err)?;

        let pmc = document.pointer("/characters/pmc").cloned();
        let nested = pmc.is_some();
        let profile: PmcProfile =
            serde_json::from_value(pmc.unwrap_or_else(|| document.clone())).map_err(json_err)?;

        debug!(path = %path.display(), nested, "profile loaded");
        Ok(FileProfileStore {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            document,
            nested,
            profile,
        })
    }

    pub fn profile(&self) -> &PmcProfile {
        &self.profile
    }

    fn check_session(&self, session_id: &str) -> Result<(), ProfileStoreError> {
        if self.session_id == session_id {
            Ok(())
        } else {
            Err(ProfileStoreError::UnknownSession(session_id.to_string()))
        }
    }
}

impl ProfileStore for FileProfileStore {
    fn profile_mut(&mut self, session_id: &str) -> Option<&mut PmcProfile> {
        self.check_session(session_id).ok()?;
        Some(&mut self.profile)
    }

    fn save(&mut self, session_id: &str) -> Result<(), ProfileStoreError> {
        self.check_session(session_id)?;
        let path = self.path.clone();
        let json_err = |source| ProfileStoreError::Json {
            path: path.clone(),
            source,
        };

        let pmc = serde_json::to_value(&self.profile).map_err(json_err)?;
        if self.nested {
            if let Some(slot) = self.document.pointer_mut("/characters/pmc") {
                *slot = pmc;
            }
        } else {
            self.document = pmc;
        }

        if backup::smart_backup(&path)? {
            info!(path = %path.display(), "profile backup created");
        }
        let data = serde_json::to_vec_pretty(&self.document).map_err(json_err)?;
        fs::write(&path, data).map_err(|source| ProfileStoreError::Io {
            path: path.clone(),
            source,
        })?;
        let (_, metadata) = backup::backup_paths(&path);
        backup::update_after_edit(&path, &metadata)?;
        Ok(())
    }
}
