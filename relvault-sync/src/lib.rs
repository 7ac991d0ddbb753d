//! # relvault-sync
//!
//! Release synchronization and retention engine.
//!
//! Call [`SyncEngine::run`] to mirror every configured repository: poll the
//! latest release, download the source archive and assets into a staged
//! version directory, commit the tag only on full archive success, and prune
//! version directories beyond the keep-count. All deletions are confined to
//! the downloads-root sandbox by [`safe_delete::remove_tree`].

pub mod download;
pub mod engine;
pub mod error;
pub mod host;
pub mod poller;
pub mod progress;
pub mod retention;
pub mod safe_delete;
pub mod version_store;

pub use engine::{sanitize_tag, CycleOutcome, RepoReport, SyncEngine};
pub use error::SyncError;
pub use host::{GithubHost, HostError, ReleaseHost, Resource};
pub use progress::{NullProgress, ProgressHandle, ProgressSink};
