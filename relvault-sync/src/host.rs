//! Remote release host seam and its GitHub implementation.
//!
//! The engine never talks HTTP directly — it consumes a [`ReleaseHost`]:
//! one read operation for latest-release metadata, one streaming read over
//! an opaque URL, and the archive URL scheme. Tests substitute scripted
//! hosts; production uses [`GithubHost`] over a blocking `ureq` agent.

use std::io::Read;
use std::time::Duration;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use relvault_core::{AssetRef, ReleaseInfo, RepoId};

const API_HOST: &str = "https://api.github.com";
const USER_AGENT: &str = "relvault";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_BYTES: &str = "application/octet-stream";

/// A failed remote operation, classified so callers can pick a policy.
///
/// Status and transport failures are both transient from the poller's point
/// of view; the split exists so "no releases" (404) can be told apart from
/// everything else at the host layer.
#[derive(Debug, Error)]
pub enum HostError {
    /// The remote answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

/// An open byte stream over a remote resource.
pub struct Resource {
    pub reader: Box<dyn Read + Send>,
    /// Declared total length, when the remote sent one. Progress only —
    /// never used for correctness.
    pub len: Option<u64>,
}

/// Capability to resolve releases and stream resources for a repository.
pub trait ReleaseHost {
    /// Latest-release metadata, or `None` when the remote has no releases.
    fn latest_release(&self, repo: &RepoId) -> Result<Option<ReleaseInfo>, HostError>;

    /// Open a streaming read over an opaque URL.
    fn open_resource(&self, url: &str) -> Result<Resource, HostError>;

    /// Download URL of the source archive for `tag`.
    fn archive_url(&self, repo: &RepoId, tag: &str) -> String;
}

// ---------------------------------------------------------------------------
// GitHub implementation
// ---------------------------------------------------------------------------

/// GitHub-backed [`ReleaseHost`] over a blocking `ureq` agent.
pub struct GithubHost {
    agent: ureq::Agent,
    token: Option<String>,
}

impl GithubHost {
    /// Build a host with the given token, request timeout, and optional
    /// proxy URL. An unparsable proxy is logged and ignored rather than
    /// failing the run.
    pub fn new(token: Option<String>, timeout: Duration, proxy: Option<&str>) -> Self {
        let mut builder = ureq::AgentBuilder::new().timeout(timeout);
        if let Some(url) = proxy {
            match ureq::Proxy::new(url) {
                Ok(p) => builder = builder.proxy(p),
                Err(err) => warn!("ignoring invalid proxy '{url}': {err}"),
            }
        }
        Self {
            agent: builder.build(),
            token,
        }
    }

    fn request(&self, url: &str, accept: &str) -> ureq::Request {
        let mut req = self
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", accept);
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("token {token}"));
        }
        req
    }
}

/// Wire shape of the GitHub latest-release payload. A missing or null
/// `tag_name` is possible in the wild and maps to "no release".
#[derive(Debug, Deserialize)]
struct ReleasePayload {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    assets: Vec<AssetPayload>,
}

#[derive(Debug, Deserialize)]
struct AssetPayload {
    name: String,
    browser_download_url: String,
}

impl ReleaseHost for GithubHost {
    fn latest_release(&self, repo: &RepoId) -> Result<Option<ReleaseInfo>, HostError> {
        let url = format!("{API_HOST}/repos/{repo}/releases/latest");
        match self.request(&url, ACCEPT_JSON).call() {
            Ok(response) => {
                let payload: ReleasePayload = response
                    .into_json()
                    .map_err(|e| HostError::Transport(e.to_string()))?;
                let Some(tag) = payload.tag_name else {
                    return Ok(None);
                };
                Ok(Some(ReleaseInfo {
                    tag,
                    assets: payload
                        .assets
                        .into_iter()
                        .map(|a| AssetRef {
                            name: a.name,
                            download_url: a.browser_download_url,
                        })
                        .collect(),
                }))
            }
            // GitHub answers 404 when a repository has no releases.
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(code, _)) => Err(HostError::Status(code)),
            Err(err) => Err(HostError::Transport(err.to_string())),
        }
    }

    fn open_resource(&self, url: &str) -> Result<Resource, HostError> {
        match self.request(url, ACCEPT_BYTES).call() {
            Ok(response) => {
                let len = response
                    .header("Content-Length")
                    .and_then(|v| v.parse().ok());
                Ok(Resource {
                    reader: Box::new(response.into_reader()),
                    len,
                })
            }
            Err(ureq::Error::Status(code, _)) => Err(HostError::Status(code)),
            Err(err) => Err(HostError::Transport(err.to_string())),
        }
    }

    fn archive_url(&self, repo: &RepoId, tag: &str) -> String {
        format!("https://github.com/{repo}/archive/refs/tags/{tag}.zip")
    }
}
