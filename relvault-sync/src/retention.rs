//! Keep-count retention over version directories.
//!
//! Ordering is by filesystem modification time, newest first; ties break by
//! path name descending so the order is deterministic and testable. Each
//! deletion is independent — one failure never aborts the rest.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};

use crate::error::{io_err, SyncError};
use crate::safe_delete;

/// One on-disk version directory under a repository root.
#[derive(Debug, Clone)]
pub struct VersionDirectory {
    pub path: PathBuf,
    /// Directory name — the sanitized tag it was staged under.
    pub tag: String,
    pub modified: SystemTime,
}

/// Immediate subdirectories of `repo_root`, newest first.
///
/// Entries whose metadata cannot be read are logged and skipped. A missing
/// `repo_root` yields an empty list.
pub fn list_version_dirs(repo_root: &Path) -> Result<Vec<VersionDirectory>, SyncError> {
    if !repo_root.exists() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(repo_root).map_err(|e| io_err(repo_root, e))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("unreadable entry under {}: {err}", repo_root.display());
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                warn!("no modification time for {}: {err}", path.display());
                continue;
            }
        };
        let tag = entry.file_name().to_string_lossy().into_owned();
        dirs.push(VersionDirectory {
            path,
            tag,
            modified,
        });
    }

    dirs.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.path.cmp(&a.path))
    });
    Ok(dirs)
}

/// Delete every version directory beyond the `keep_count` most recent.
///
/// `keep_count == 0` makes every directory eligible. Deletion failures are
/// logged; pruning continues with the remaining entries.
pub fn prune(sandbox: &Path, repo_root: &Path, keep_count: usize) -> Result<(), SyncError> {
    let dirs = list_version_dirs(repo_root)?;
    if dirs.len() <= keep_count {
        debug!(
            "{}: {} version dir(s), keep-count {keep_count}, nothing to prune",
            repo_root.display(),
            dirs.len()
        );
        return Ok(());
    }

    for dir in &dirs[keep_count..] {
        match safe_delete::remove_tree(sandbox, &dir.path) {
            Ok(()) => debug!("pruned {}", dir.path.display()),
            Err(err) => warn!("failed to prune {}: {err}", dir.path.display()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    use super::*;

    /// Create a version directory with a deterministic mtime (seconds since
    /// an arbitrary fixed epoch offset).
    fn version_dir(root: &Path, name: &str, mtime_secs: i64) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("artifact.bin"), name.as_bytes()).unwrap();
        set_file_mtime(&dir, FileTime::from_unix_time(1_700_000_000 + mtime_secs, 0)).unwrap();
        dir
    }

    fn surviving_names(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn keeps_the_most_recent_and_deletes_the_rest() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "v1.0.0", 10);
        version_dir(&root, "v2.0.0", 20);
        version_dir(&root, "v3.0.0", 30);

        prune(sandbox.path(), &root, 2).unwrap();
        assert_eq!(surviving_names(&root), vec!["v2.0.0", "v3.0.0"]);
    }

    #[test]
    fn fewer_dirs_than_keep_count_deletes_nothing() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "v1.0.0", 10);
        version_dir(&root, "v2.0.0", 20);

        prune(sandbox.path(), &root, 5).unwrap();
        assert_eq!(surviving_names(&root), vec!["v1.0.0", "v2.0.0"]);
    }

    #[test]
    fn keep_count_zero_deletes_everything() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "v1.0.0", 10);
        version_dir(&root, "v2.0.0", 20);

        prune(sandbox.path(), &root, 0).unwrap();
        assert!(surviving_names(&root).is_empty());
    }

    #[test]
    fn missing_repo_root_is_a_no_op() {
        let sandbox = TempDir::new().unwrap();
        prune(sandbox.path(), &sandbox.path().join("ghost"), 3).unwrap();
    }

    #[test]
    fn equal_mtimes_break_ties_by_path_name_descending() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "alpha", 10);
        version_dir(&root, "beta", 10);

        // "beta" ranks first on the name tie-break, so "alpha" is pruned.
        prune(sandbox.path(), &root, 1).unwrap();
        assert_eq!(surviving_names(&root), vec!["beta"]);
    }

    #[test]
    fn regular_files_under_repo_root_are_ignored() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "v1.0.0", 10);
        std::fs::write(root.join("version.txt"), "v1.0.0\n").unwrap();

        prune(sandbox.path(), &root, 0).unwrap();
        assert!(root.join("version.txt").exists(), "version record must survive");
        assert!(surviving_names(&root).is_empty());
    }

    #[test]
    fn list_orders_newest_first() {
        let sandbox = TempDir::new().unwrap();
        let root = sandbox.path().join("widget");
        version_dir(&root, "v1.0.0", 10);
        version_dir(&root, "v3.0.0", 30);
        version_dir(&root, "v2.0.0", 20);

        let dirs = list_version_dirs(&root).unwrap();
        let tags: Vec<&str> = dirs.iter().map(|d| d.tag.as_str()).collect();
        assert_eq!(tags, vec!["v3.0.0", "v2.0.0", "v1.0.0"]);
    }
}
