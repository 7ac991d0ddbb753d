//! Sandbox-confined recursive deletion.
//!
//! Every deletion in the engine funnels through [`remove_tree`], which
//! refuses any target outside the sandbox root (the downloads root) before
//! touching the filesystem. Inside the sandbox, deletion is best-effort
//! with escalating strategies:
//!
//! 1. direct `remove_dir_all`
//! 2. clear read-only permission bits per entry, then retry
//! 3. the platform's forced recursive delete, exit status logged only
//!
//! Only the containment check can fail the call; strategy failures degrade
//! to "delete attempted, outcome unknown".

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use log::{error, warn};
use walkdir::WalkDir;

use crate::error::SyncError;

/// Delete the directory tree at `target`, confined to `sandbox`.
///
/// Missing targets are a successful no-op. `SyncError::Security` is the
/// only error: the resolved target was not inside the sandbox, and nothing
/// was deleted.
pub fn remove_tree(sandbox: &Path, target: &Path) -> Result<(), SyncError> {
    let sandbox_abs = normalize(sandbox);
    let target_abs = normalize(target);

    if !target_abs.starts_with(&sandbox_abs) {
        return Err(SyncError::Security {
            path: target_abs,
            sandbox: sandbox_abs,
        });
    }

    if !target_abs.exists() {
        return Ok(());
    }

    if !target_abs.is_dir() {
        if let Err(err) = std::fs::remove_file(&target_abs) {
            warn!("failed to delete file {}: {err}", target_abs.display());
        }
        return Ok(());
    }

    // Unreadable directory: listing it is a precondition for every strategy.
    if let Err(err) = std::fs::read_dir(&target_abs) {
        if err.kind() == ErrorKind::PermissionDenied {
            warn!("cannot list {}, skipping deletion: {err}", target_abs.display());
            return Ok(());
        }
    }

    match std::fs::remove_dir_all(&target_abs) {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            warn!(
                "direct delete of {} hit permissions, clearing read-only bits: {err}",
                target_abs.display()
            );
            if clear_readonly_and_remove(&target_abs) {
                return Ok(());
            }
        }
        Err(err) => {
            error!("failed to delete {}: {err}", target_abs.display());
        }
    }

    force_remove(&target_abs);
    Ok(())
}

/// Resolve to an absolute, lexically normalized path. `..` never climbs
/// past the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Strategy 2: walk the tree clearing read-only bits, then delete again.
fn clear_readonly_and_remove(target: &Path) -> bool {
    for entry in WalkDir::new(target).into_iter().filter_map(|e| e.ok()) {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let mut perms = metadata.permissions();
        if perms.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            if let Err(err) = std::fs::set_permissions(entry.path(), perms) {
                warn!(
                    "failed to clear read-only on {}: {err}",
                    entry.path().display()
                );
            }
        }
    }

    match std::fs::remove_dir_all(target) {
        Ok(()) => true,
        Err(err) => {
            error!(
                "delete of {} still failing after permission pass: {err}",
                target.display()
            );
            false
        }
    }
}

/// Strategy 3: hand the tree to the OS. Non-zero exit is logged, not raised.
fn force_remove(target: &Path) {
    let status = if cfg!(windows) {
        Command::new("cmd")
            .args(["/c", "rd", "/s", "/q"])
            .arg(target)
            .status()
    } else {
        Command::new("rm").arg("-rf").arg(target).status()
    };

    match status {
        Ok(code) if code.success() => {}
        Ok(code) => error!("forced delete of {} exited with {code}", target.display()),
        Err(err) => error!("forced delete of {} failed to spawn: {err}", target.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn deletes_nested_tree_inside_sandbox() {
        let sandbox = TempDir::new().unwrap();
        let victim = sandbox.path().join("widget").join("v1.0.0");
        std::fs::create_dir_all(victim.join("nested")).unwrap();
        std::fs::write(victim.join("nested").join("a.bin"), b"data").unwrap();

        remove_tree(sandbox.path(), &victim).unwrap();
        assert!(!victim.exists());
        assert!(sandbox.path().join("widget").exists(), "parent must survive");
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let sandbox = TempDir::new().unwrap();
        remove_tree(sandbox.path(), &sandbox.path().join("ghost")).unwrap();
    }

    #[test]
    fn target_outside_sandbox_is_refused() {
        let sandbox = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let victim = outside.path().join("precious");
        std::fs::create_dir_all(&victim).unwrap();

        let err = remove_tree(sandbox.path(), &victim).unwrap_err();
        assert!(matches!(err, SyncError::Security { .. }), "got {err:?}");
        assert!(victim.exists(), "filesystem must be unchanged");
    }

    #[test]
    fn parent_traversal_cannot_escape_sandbox() {
        let outer = TempDir::new().unwrap();
        let sandbox = outer.path().join("sandbox");
        let escape_target = outer.path().join("escapee");
        std::fs::create_dir_all(&sandbox).unwrap();
        std::fs::create_dir_all(&escape_target).unwrap();

        let sneaky = sandbox.join("v1").join("..").join("..").join("escapee");
        let err = remove_tree(&sandbox, &sneaky).unwrap_err();
        assert!(matches!(err, SyncError::Security { .. }));
        assert!(escape_target.exists());
    }

    #[test]
    fn sandbox_root_itself_is_deletable() {
        let outer = TempDir::new().unwrap();
        let sandbox = outer.path().join("downloads");
        std::fs::create_dir_all(sandbox.join("widget")).unwrap();
        remove_tree(&sandbox, &sandbox).unwrap();
        assert!(!sandbox.exists());
    }

    #[test]
    #[cfg(unix)]
    fn read_only_entries_are_cleared_and_deleted() {
        use std::os::unix::fs::PermissionsExt;

        let sandbox = TempDir::new().unwrap();
        let victim = sandbox.path().join("v1.0.0");
        let stubborn = victim.join("stubborn");
        std::fs::create_dir_all(&stubborn).unwrap();
        std::fs::write(stubborn.join("locked.bin"), b"data").unwrap();

        let mut perms = std::fs::metadata(&stubborn).unwrap().permissions();
        perms.set_mode(0o555);
        std::fs::set_permissions(&stubborn, perms).unwrap();

        remove_tree(sandbox.path(), &victim).unwrap();
        assert!(!victim.exists());
    }
}
