//! Synchronization orchestrator.
//!
//! Per-repository cycle: poll → compare against the committed tag → stage a
//! version directory → download archive-then-assets → commit the tag →
//! prune. The source archive is the primary artifact — its failure rolls
//! the staged directory back; individual asset failures are tolerated and
//! only counted.
//!
//! Repositories are processed strictly sequentially with a configured pause
//! between them. Cancellation is a flag observed between repositories and,
//! via the download manager, between chunks.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};

use relvault_core::{Config, ReleaseInfo, RepoId};

use crate::download;
use crate::error::{io_err, SyncError};
use crate::host::ReleaseHost;
use crate::poller::{self, RetryPolicy};
use crate::progress::ProgressSink;
use crate::retention;
use crate::safe_delete;
use crate::version_store;

/// How one repository's cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No release to mirror, or the poll failed; nothing changed on disk.
    Skipped { reason: String },
    /// Remote tag equals the committed tag; retention still ran.
    Unchanged { tag: String },
    /// A new tag was downloaded and committed. `assets_failed` counts
    /// supplementary assets that could not be fetched.
    Updated { tag: String, assets_failed: usize },
    /// The cycle failed and the tag was not committed. An archive failure
    /// also tears the staged directory down.
    Failed { reason: String },
}

/// Outcome of one repository within a run.
#[derive(Debug, Clone)]
pub struct RepoReport {
    pub repo: RepoId,
    pub outcome: CycleOutcome,
}

/// The per-run synchronization engine. Holds only borrowed collaborators —
/// construction is free and the engine is discarded after [`run`](Self::run).
pub struct SyncEngine<'a> {
    config: &'a Config,
    host: &'a dyn ReleaseHost,
    progress: &'a dyn ProgressSink,
    cancel: Arc<AtomicBool>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(config: &'a Config, host: &'a dyn ReleaseHost, progress: &'a dyn ProgressSink) -> Self {
        Self {
            config,
            host,
            progress,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag observed between repositories and between download chunks.
    /// Setting it ends the run at the next checkpoint.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Process every configured repository in order.
    ///
    /// Errors are contained per repository: a failed cycle is reported and
    /// the run continues with the next one.
    pub fn run(&self) -> Vec<RepoReport> {
        let mut reports = Vec::with_capacity(self.config.repositories.len());
        for (index, repo) in self.config.repositories.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                info!("cancellation requested, stopping before {repo}");
                break;
            }
            if index > 0 && !self.config.repo_delay().is_zero() {
                thread::sleep(self.config.repo_delay());
            }
            reports.push(RepoReport {
                repo: repo.clone(),
                outcome: self.sync_repo(repo),
            });
        }
        reports
    }

    /// Run one repository's cycle. Never panics, never propagates — the
    /// outcome captures how it ended.
    pub fn sync_repo(&self, repo: &RepoId) -> CycleOutcome {
        match self.run_cycle(repo) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("{repo}: cycle failed: {err}");
                CycleOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn run_cycle(&self, repo: &RepoId) -> Result<CycleOutcome, SyncError> {
        let retry = RetryPolicy {
            max_attempts: self.config.max_retries,
            base_delay: self.config.retry_base_delay(),
        };

        let release = match poller::poll_latest(self.host, repo, &retry) {
            Ok(Some(release)) => release,
            Ok(None) => {
                info!("{repo}: no releases, skipping");
                return Ok(CycleOutcome::Skipped {
                    reason: "no releases".to_string(),
                });
            }
            Err(err) => {
                warn!("{repo}: {err}");
                return Ok(CycleOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
        };

        let root = &self.config.downloads_root;
        let repo_root = root.join(repo.name());
        let committed = version_store::read(root, repo)?;

        if committed.as_deref() == Some(release.tag.as_str()) {
            info!("{repo}: already at {}", release.tag);
            self.run_retention(repo, &repo_root);
            return Ok(CycleOutcome::Unchanged { tag: release.tag });
        }

        info!(
            "{repo}: new release {} (local: {})",
            release.tag,
            committed.as_deref().unwrap_or("none")
        );

        let staged = self.stage_version_dir(repo, &repo_root, &release.tag)?;

        match self.download_release(repo, &release, &staged) {
            Ok(assets_failed) => {
                version_store::write(root, repo, &release.tag)?;
                info!("{repo}: committed {}", release.tag);
                self.run_retention(repo, &repo_root);
                Ok(CycleOutcome::Updated {
                    tag: release.tag,
                    assets_failed,
                })
            }
            Err(err) => {
                // The archive is the primary artifact; without it the staged
                // directory is not a usable mirror. Tear it down.
                warn!("{repo}: rolling back staged {}: {err}", staged.display());
                if let Err(cleanup) = safe_delete::remove_tree(root, &staged) {
                    error!("{repo}: rollback failed: {cleanup}");
                }
                Ok(CycleOutcome::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Create an empty version directory for `tag`, deleting any stale
    /// leftover from an interrupted earlier run.
    fn stage_version_dir(
        &self,
        repo: &RepoId,
        repo_root: &Path,
        tag: &str,
    ) -> Result<PathBuf, SyncError> {
        let staged = repo_root.join(sanitize_tag(tag));
        if staged.exists() {
            warn!("{repo}: removing stale staged directory {}", staged.display());
            safe_delete::remove_tree(&self.config.downloads_root, &staged)?;
        }
        std::fs::create_dir_all(&staged).map_err(|e| io_err(&staged, e))?;
        Ok(staged)
    }

    /// Fetch the source archive (mandatory) and each asset (best-effort)
    /// into `staged`. Returns the number of assets that failed.
    fn download_release(
        &self,
        repo: &RepoId,
        release: &ReleaseInfo,
        staged: &Path,
    ) -> Result<usize, SyncError> {
        let archive_url = self.host.archive_url(repo, &release.tag);
        let archive_name = format!("{}-{}-source.zip", repo.name(), sanitize_tag(&release.tag));
        download::fetch(
            self.host,
            &archive_url,
            &staged.join(archive_name),
            self.progress,
            &self.cancel,
        )?;

        let mut assets_failed = 0;
        for asset in &release.assets {
            let dest = staged.join(&asset.name);
            match download::fetch(self.host, &asset.download_url, &dest, self.progress, &self.cancel)
            {
                Ok(()) => info!("{repo}: fetched asset {}", asset.name),
                Err(err) => {
                    warn!("{repo}: asset {} failed: {err}", asset.name);
                    assets_failed += 1;
                }
            }
        }
        Ok(assets_failed)
    }

    fn run_retention(&self, repo: &RepoId, repo_root: &Path) {
        if let Err(err) =
            retention::prune(&self.config.downloads_root, repo_root, self.config.keep_count)
        {
            warn!("{repo}: retention failed: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tag sanitization
// ---------------------------------------------------------------------------

/// Replace filesystem-unsafe characters in a tag with `_` so it can name a
/// version directory. `.` and `..` are mapped away entirely.
pub fn sanitize_tag(tag: &str) -> String {
    match tag {
        "." => return "_".to_string(),
        ".." => return "__".to_string(),
        _ => {}
    }
    tag.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
