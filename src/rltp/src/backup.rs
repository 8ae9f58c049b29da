//! Profile backups with hash tracking.
//!
//! Before a profile file is rewritten for the first time a copy is kept next
//! to it as `<name>.bak`, with a `<name>.bak.json` sidecar recording the
//! hash of the original and of the last write. A new copy is only taken when
//! the file on disk matches neither, i.e. someone replaced it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Hash of the file when the backup was taken
    pub original_hash: String,

    /// Hash of the file after our last write
    pub last_edit_hash: String,
}

impl BackupMetadata {
    pub fn new(hash: String) -> Self {
        BackupMetadata {
            original_hash: hash.clone(),
            last_edit_hash: hash,
        }
    }
}

/// SHA-256 of a file, hex encoded
pub fn hash_file(path: &Path) -> Result<String, BackupError> {
    let data = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&data)))
}

/// Backup copy and sidecar paths for a profile file
pub fn backup_paths(profile_path: &Path) -> (PathBuf, PathBuf) {
    let mut backup = profile_path.as_os_str().to_owned();
    backup.push(".bak");
    let mut metadata = backup.clone();
    metadata.push(".json");
    (PathBuf::from(backup), PathBuf::from(metadata))
}

pub fn read_metadata(metadata_path: &Path) -> Result<Option<BackupMetadata>, BackupError> {
    if !metadata_path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(metadata_path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn write_metadata(metadata_path: &Path, metadata: &BackupMetadata) -> Result<(), BackupError> {
    fs::write(metadata_path, serde_json::to_string_pretty(metadata)?)?;
    Ok(())
}

/// Whether the file on disk needs a fresh backup.
///
/// A backup without a sidecar is never overwritten.
pub fn should_create_backup(
    profile_path: &Path,
    backup_path: &Path,
    metadata_path: &Path,
) -> Result<bool, BackupError> {
    if !backup_path.exists() {
        return Ok(true);
    }
    let Some(metadata) = read_metadata(metadata_path)? else {
        return Ok(false);
    };
    let current = hash_file(profile_path)?;
    Ok(current != metadata.original_hash && current != metadata.last_edit_hash)
}

pub fn create_backup(
    profile_path: &Path,
    backup_path: &Path,
    metadata_path: &Path,
) -> Result<(), BackupError> {
    fs::copy(profile_path, backup_path)?;
    let metadata = BackupMetadata::new(hash_file(profile_path)?);
    write_metadata(metadata_path, &metadata)
}

/// Record the hash of a file we just wrote
pub fn update_after_edit(profile_path: &Path, metadata_path: &Path) -> Result<(), BackupError> {
    let current = hash_file(profile_path)?;
    let mut metadata =
        read_metadata(metadata_path)?.unwrap_or_else(|| BackupMetadata::new(current.clone()));
    metadata.last_edit_hash = current;
    write_metadata(metadata_path, &metadata)
}

/// Back the file up if needed. Returns true when a copy was taken.
pub fn smart_backup(profile_path: &Path) -> Result<bool, BackupError> {
    if !profile_path.exists() {
        return Ok(false);
    }
    let (backup_path, metadata_path) = backup_paths(profile_path);
    if should_create_backup(profile_path, &backup_path, &metadata_path)? {
        create_backup(profile_path, &backup_path, &metadata_path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
