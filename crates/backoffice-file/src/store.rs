//! JSON file credential store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use backoffice_core::error::{Error, StorageError};
use backoffice_core::{CredentialStore, Result, SessionEntries};

fn map_io(path: &Path, err: io::Error) -> Error {
    Error::Storage(StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn corrupt(err: serde_json::Error) -> Error {
    Error::Storage(StorageError::Corrupt {
        message: err.to_string(),
    })
}

/// Credential store persisted as a single JSON file.
///
/// The file holds the flat `at`/`rt`/`user` entries. Every update takes an
/// exclusive lock on a sibling `.lock` file, re-reads the file, applies the
/// change and replaces the file through a rename, so concurrent processes
/// sharing one path never see a torn write. An empty session removes the
/// file, even one that no longer decodes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<SessionEntries>,
}

impl FileStore {
    /// Open the store at `path`, loading any session already persisted.
    ///
    /// A missing file is an empty store. A file that does not decode is an
    /// error rather than a silent logout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path)?;
        debug!(
            path = %path.display(),
            authenticated = entries.is_authenticated(),
            "Opened session file"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| map_io(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| map_io(&lock_path, e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(&lock_path, e))?;

        Ok(lock_file)
    }

    fn persist(&self, entries: &SessionEntries) -> Result<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(map_io(&self.path, e)),
            };
        }

        let content = serde_json::to_vec_pretty(entries).map_err(corrupt)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = create_private(&temp_path).map_err(|e| map_io(&temp_path, e))?;
        file.write_all(&content)
            .and_then(|()| file.sync_all())
            .map_err(|e| map_io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| map_io(&self.path, e))
    }
}

impl CredentialStore for FileStore {
    fn snapshot(&self) -> SessionEntries {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn update(&self, change: &mut dyn FnMut(&mut SessionEntries) -> Result<()>) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let lock_file = self.lock()?;

        // Another process may have written since this one last looked.
        let next = match read_entries(&self.path) {
            Ok(mut current) => {
                change(&mut current)?;
                current
            }
            Err(err @ Error::Storage(StorageError::Corrupt { .. })) => {
                // Only a change that empties the session may replace an unreadable file.
                let mut fresh = SessionEntries::default();
                if change(&mut fresh).is_err() || !fresh.is_empty() {
                    return Err(err);
                }
                warn!("Removing unreadable session file");
                fresh
            }
            Err(err) => return Err(err),
        };
        self.persist(&next)?;

        if let Err(e) = FileExt::unlock(&lock_file) {
            warn!(error = %e, "Failed to release session lock");
        }

        *guard = next;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<SessionEntries> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SessionEntries::default()),
        Err(e) => return Err(map_io(path, e)),
    };

    serde_json::from_slice(&content).map_err(corrupt)
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    File::create(path)
}
