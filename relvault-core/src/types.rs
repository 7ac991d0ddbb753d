//! Domain types for release mirroring.
//!
//! All path handling lives in `relvault-sync`; this module only models what a
//! remote release looks like and how a repository is identified.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidRepoId;

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// A strongly-typed GitHub repository slug in `owner/name` form.
///
/// Construction validates the shape: exactly one `/`, both halves non-empty.
/// The short `name` half doubles as the repository's directory name under the
/// downloads root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId(String);

impl RepoId {
    /// Parse an `owner/name` slug.
    pub fn new(slug: impl Into<String>) -> Result<Self, InvalidRepoId> {
        let slug = slug.into();
        let mut halves = slug.split('/');
        match (halves.next(), halves.next(), halves.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self(slug))
            }
            _ => Err(InvalidRepoId(slug)),
        }
    }

    /// The full `owner/name` slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `owner` half.
    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// The short `name` half — used for the on-disk repository directory.
    pub fn name(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RepoId {
    type Error = InvalidRepoId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.0
    }
}

// ---------------------------------------------------------------------------
// Release metadata
// ---------------------------------------------------------------------------

/// One downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Filesystem entry name, as reported by the remote. Collisions within a
    /// release overwrite (last wins).
    pub name: String,
    pub download_url: String,
}

/// Latest-release metadata for a repository, produced fresh per poll.
///
/// Never persisted as a whole — only the tag is committed to the version
/// store, and only after a successful download cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub assets: Vec<AssetRef>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
