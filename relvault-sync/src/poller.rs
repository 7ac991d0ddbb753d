//! Latest-release polling with bounded retry.
//!
//! Retry policy: transport errors and non-success statuses are both
//! transient; attempt `n` sleeps `base_delay * n` before retrying. "No
//! releases" and a release with an empty tag are not errors — the
//! repository is simply skipped for this cycle.

use std::thread;
use std::time::Duration;

use log::warn;

use relvault_core::{ReleaseInfo, RepoId};

use crate::error::SyncError;
use crate::host::ReleaseHost;

/// Retry knobs for [`poll_latest`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Resolve latest-release metadata for `repo`, retrying on transient failure.
///
/// Returns `Ok(None)` when the remote reports no releases (or a release with
/// no usable tag); `SyncError::Network` once retries are exhausted.
pub fn poll_latest(
    host: &dyn ReleaseHost,
    repo: &RepoId,
    retry: &RetryPolicy,
) -> Result<Option<ReleaseInfo>, SyncError> {
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match host.latest_release(repo) {
            Ok(Some(release)) => {
                if release.tag.trim().is_empty() {
                    warn!("{repo}: latest release has no usable tag, skipping");
                    return Ok(None);
                }
                return Ok(Some(release));
            }
            Ok(None) => return Ok(None),
            Err(err) if attempt < attempts => {
                warn!("{repo}: release query attempt {attempt}/{attempts} failed: {err}");
                thread::sleep(retry.base_delay * attempt);
            }
            Err(err) => {
                return Err(SyncError::Network {
                    repo: repo.clone(),
                    source: err,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use relvault_core::AssetRef;

    use super::*;
    use crate::host::{HostError, Resource};

    /// Host that fails the first `failures` metadata queries, then yields
    /// `release`.
    struct FlakyHost {
        failures: Cell<u32>,
        release: Option<ReleaseInfo>,
    }

    impl ReleaseHost for FlakyHost {
        fn latest_release(&self, _repo: &RepoId) -> Result<Option<ReleaseInfo>, HostError> {
            let remaining = self.failures.get();
            if remaining > 0 {
                self.failures.set(remaining - 1);
                return Err(HostError::Status(503));
            }
            Ok(self.release.clone())
        }

        fn open_resource(&self, url: &str) -> Result<Resource, HostError> {
            Err(HostError::Transport(format!("unexpected fetch of {url}")))
        }

        fn archive_url(&self, repo: &RepoId, tag: &str) -> String {
            format!("fake://{repo}/{tag}.zip")
        }
    }

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn release(tag: &str) -> ReleaseInfo {
        ReleaseInfo {
            tag: tag.to_string(),
            assets: vec![AssetRef {
                name: "tool.bin".into(),
                download_url: "fake://asset".into(),
            }],
        }
    }

    #[test]
    fn succeeds_before_retries_exhausted() {
        let host = FlakyHost {
            failures: Cell::new(2),
            release: Some(release("v1.2.3")),
        };
        let repo = RepoId::new("acme/widget").unwrap();
        let got = poll_latest(&host, &repo, &no_delay(3)).unwrap();
        assert_eq!(got.unwrap().tag, "v1.2.3");
        assert_eq!(host.failures.get(), 0);
    }

    #[test]
    fn exhausted_retries_surface_network_error() {
        let host = FlakyHost {
            failures: Cell::new(5),
            release: Some(release("v1.2.3")),
        };
        let repo = RepoId::new("acme/widget").unwrap();
        let err = poll_latest(&host, &repo, &no_delay(3)).unwrap_err();
        assert!(matches!(err, SyncError::Network { .. }), "got {err:?}");
        // Three attempts consumed, two queued failures left.
        assert_eq!(host.failures.get(), 2);
    }

    #[test]
    fn absent_release_is_not_an_error() {
        let host = FlakyHost {
            failures: Cell::new(0),
            release: None,
        };
        let repo = RepoId::new("acme/widget").unwrap();
        assert!(poll_latest(&host, &repo, &no_delay(3)).unwrap().is_none());
    }

    #[test]
    fn empty_tag_counts_as_absent() {
        let host = FlakyHost {
            failures: Cell::new(0),
            release: Some(release("   ")),
        };
        let repo = RepoId::new("acme/widget").unwrap();
        assert!(poll_latest(&host, &repo, &no_delay(3)).unwrap().is_none());
    }
}
