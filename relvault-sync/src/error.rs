//! Error types for relvault-sync.

use std::path::PathBuf;

use thiserror::Error;

use relvault_core::RepoId;

use crate::host::HostError;

/// All errors that can arise from a sync cycle.
///
/// Containment policy: every variant is scoped to one repository's cycle.
/// The engine logs and moves on — no error here aborts the overall run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Latest-release query exhausted its retries.
    #[error("release query failed for {repo}: {source}")]
    Network {
        repo: RepoId,
        #[source]
        source: HostError,
    },

    /// A fetch failed; the partial file has already been removed.
    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A deletion target resolved outside the sandbox root. Never retried
    /// with a different strategy.
    #[error("refusing to delete {path}: outside sandbox {sandbox}")]
    Security { path: PathBuf, sandbox: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
