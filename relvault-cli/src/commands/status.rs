//! `relvault status` — local mirror state, no network.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use relvault_core::Config;
use relvault_sync::{retention, version_store};

/// Arguments for `relvault status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to the run configuration.
    #[arg(long, default_value = "relvault.yaml")]
    pub config: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct RepoStatus {
    repository: String,
    committed_tag: Option<String>,
    version_dirs: usize,
    newest_version_at: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "committed")]
    committed: String,
    #[tabled(rename = "versions")]
    versions: usize,
    #[tabled(rename = "newest")]
    newest: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::load(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;

        let mut statuses = Vec::with_capacity(config.repositories.len());
        for repo in &config.repositories {
            let committed = version_store::read(&config.downloads_root, repo)
                .ok()
                .flatten();
            let dirs = retention::list_version_dirs(&config.downloads_root.join(repo.name()))
                .unwrap_or_default();
            statuses.push(RepoStatus {
                repository: repo.to_string(),
                committed_tag: committed,
                version_dirs: dirs.len(),
                newest_version_at: dirs.first().map(|d| format_timestamp(d.modified)),
            });
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&statuses)?);
            return Ok(());
        }

        if statuses.is_empty() {
            println!("No repositories configured.");
            return Ok(());
        }

        let rows: Vec<StatusTableRow> = statuses
            .iter()
            .map(|s| StatusTableRow {
                repository: s.repository.clone(),
                committed: match &s.committed_tag {
                    Some(tag) => tag.green().to_string(),
                    None => "—".dimmed().to_string(),
                },
                versions: s.version_dirs,
                newest: s.newest_version_at.clone().unwrap_or_else(|| "—".into()),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        Ok(())
    }
}

fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
