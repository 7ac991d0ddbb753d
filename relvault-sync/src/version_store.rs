//! Committed-version record per repository.
//!
//! The record is a single trimmed line in
//! `<downloads_root>/<repo-name>/version.txt`. It is written only after a
//! cycle's artifacts are fully on disk; a crash before the write merely
//! causes a re-download next run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use relvault_core::RepoId;

use crate::error::{io_err, SyncError};

const RECORD_NAME: &str = "version.txt";

/// `<root>/<repo-name>/version.txt` — pure, no I/O.
pub fn record_path(root: &Path, repo: &RepoId) -> PathBuf {
    root.join(repo.name()).join(RECORD_NAME)
}

/// Read the committed tag for `repo`, or `None` if no record exists.
pub fn read(root: &Path, repo: &RepoId) -> Result<Option<String>, SyncError> {
    let path = record_path(root, repo);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let tag = contents.trim();
            if tag.is_empty() {
                Ok(None)
            } else {
                Ok(Some(tag.to_string()))
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Commit `tag` for `repo`, creating the repository directory if needed.
pub fn write(root: &Path, repo: &RepoId, tag: &str) -> Result<(), SyncError> {
    let path = record_path(root, repo);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    std::fs::write(&path, format!("{}\n", tag.trim())).map_err(|e| io_err(&path, e))
}
