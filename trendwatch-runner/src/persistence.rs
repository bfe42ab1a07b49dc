//! State file persistence.
//!
//! The store is read once at the start of a run and written once at the end.
//! Writes go to a sibling temp file which is then renamed over the target, so
//! a crash mid-write never leaves a truncated state file behind.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use trendwatch_core::state::SignalStateStore;

#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of loading the state file.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub store: SignalStateStore,
    /// Set when an unreadable file was moved aside.
    pub quarantined: Option<PathBuf>,
}

/// Path the corrupt file is moved to: `<file>.corrupt`.
pub fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Read and parse the state file. `Ok(None)` for a missing or empty file; the
/// inner error is a parse failure.
fn read_store(
    path: &Path,
) -> Result<Option<Result<SignalStateStore, serde_json::Error>>, StateFileError> {
    if !path.exists() {
        debug!(path = %path.display(), "no state file, starting empty");
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| StateFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str::<SignalStateStore>(&content)))
}

/// Load the store. A missing or empty file is an empty store; a file that
/// does not parse is quarantined and the run starts from an empty store.
pub fn load_state(path: &Path) -> Result<LoadedState, StateFileError> {
    match read_store(path)? {
        None => Ok(LoadedState::default()),
        Some(Ok(store)) => {
            debug!(path = %path.display(), records = store.len(), "loaded state");
            Ok(LoadedState {
                store,
                quarantined: None,
            })
        }
        Some(Err(e)) => {
            let target = quarantine_path(path);
            warn!(
                path = %path.display(),
                quarantine = %target.display(),
                error = %e,
                "state file is unreadable, starting empty"
            );
            fs::rename(path, &target).map_err(|source| StateFileError::Write {
                path: target.clone(),
                source,
            })?;
            Ok(LoadedState {
                store: SignalStateStore::new(),
                quarantined: Some(target),
            })
        }
    }
}

/// Like [`load_state`] but never touches the file system: an unreadable
/// file is logged and treated as an empty store.
pub fn peek_state(path: &Path) -> Result<LoadedState, StateFileError> {
    match read_store(path)? {
        None => Ok(LoadedState::default()),
        Some(Ok(store)) => Ok(LoadedState {
            store,
            quarantined: None,
        }),
        Some(Err(e)) => {
            warn!(
                path = %path.display(),
                error = %e,
                "state file is unreadable, starting empty without moving it"
            );
            Ok(LoadedState::default())
        }
    }
}

/// Write the store atomically as pretty-printed JSON.
pub fn save_state(path: &Path, store: &SignalStateStore) -> Result<(), StateFileError> {
    let json = serde_json::to_string_pretty(store)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StateFileError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|source| StateFileError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StateFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), records = store.len(), "saved state");
    Ok(())
}
