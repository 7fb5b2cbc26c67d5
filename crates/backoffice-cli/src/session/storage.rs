//! Location of the persisted session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use backoffice_file::FileStore;

/// Resolve the session file path, falling back to the user data directory.
pub fn session_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let dirs =
        ProjectDirs::from("", "", "backoffice").context("Could not determine data directory")?;

    Ok(dirs.data_dir().join("session.json"))
}

/// Open the session file store.
pub fn open_store(explicit: Option<&Path>) -> Result<FileStore> {
    let path = session_path(explicit)?;
    FileStore::open(&path)
        .with_context(|| format!("Failed to open session file {}", path.display()))
}
