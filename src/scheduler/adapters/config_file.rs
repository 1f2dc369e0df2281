//! Loads worker configuration from a directory.

use crate::scheduler::domain::{WORKER_CONFIG_FILE, WorkerConfig, WorkerConfigError};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io::ErrorKind;

/// Reads `.baton.json` from `dir`.
///
/// A missing file yields the default configuration.
///
/// # Errors
///
/// Returns [`WorkerConfigError`] when the file cannot be read, is malformed
/// or fails validation.
pub fn load_worker_config(dir: &Dir) -> Result<WorkerConfig, WorkerConfigError> {
    match dir.read_to_string(WORKER_CONFIG_FILE) {
        Ok(document) => WorkerConfig::from_json(&document),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(WorkerConfig::default()),
        Err(source) => Err(WorkerConfigError::Read {
            path: Utf8PathBuf::from(WORKER_CONFIG_FILE),
            source,
        }),
    }
}

/// Opens `path` with ambient authority and reads its `.baton.json`.
///
/// # Errors
///
/// Returns [`WorkerConfigError::Read`] when the directory cannot be opened
/// and the errors of [`load_worker_config`].
pub fn load_worker_config_from(path: &Utf8Path) -> Result<WorkerConfig, WorkerConfigError> {
    let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(|source| {
        WorkerConfigError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    load_worker_config(&dir)
}
