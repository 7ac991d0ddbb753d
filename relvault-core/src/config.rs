//! YAML run configuration.
//!
//! A single config file describes one run: which repositories to mirror,
//! where the downloads root lives, and the retry/retention/scheduling knobs.
//! The engine treats the loaded [`Config`] as read-only for the whole run —
//! there is no process-wide mutable state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::RepoId;

/// Run configuration, loaded once and passed by reference into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Repositories to mirror, processed strictly in this order.
    pub repositories: Vec<RepoId>,

    /// Root directory for all mirrored data. Also the deletion sandbox:
    /// nothing outside this tree is ever removed.
    #[serde(default = "default_downloads_root")]
    pub downloads_root: PathBuf,

    /// GitHub API token. Falls back to `$GITHUB_TOKEN` when unset.
    #[serde(default)]
    pub token: Option<String>,

    /// Attempts per latest-release query before the repository is skipped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between poll retries; attempt `n` waits `n * base`.
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,

    /// Pause between repositories, to stay under remote rate limits.
    #[serde(default = "default_repo_delay_secs")]
    pub repo_delay_secs: u64,

    /// Number of most-recent version directories to retain per repository.
    /// Zero makes every version directory eligible for pruning.
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional HTTP(S) proxy URL for all remote traffic.
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_downloads_root() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_secs() -> u64 {
    5
}

fn default_repo_delay_secs() -> u64 {
    1
}

fn default_keep_count() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// Returns `ConfigError::Parse` (with path + line context) if malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The API token to use: the configured value, else `$GITHUB_TOKEN`.
    pub fn effective_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_base_delay_secs)
    }

    pub fn repo_delay(&self) -> Duration {
        Duration::from_secs(self.repo_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
