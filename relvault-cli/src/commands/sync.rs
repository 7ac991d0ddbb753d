//! `relvault sync` — mirror new releases for every configured repository.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use relvault_core::{Config, RepoId};
use relvault_sync::{CycleOutcome, GithubHost, NullProgress, ProgressSink, RepoReport, SyncEngine};

use crate::progress::BarProgress;

/// Arguments for `relvault sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the run configuration.
    #[arg(long, default_value = "relvault.yaml")]
    pub config: PathBuf,

    /// Sync only this repository (must be present in the configuration).
    #[arg(long)]
    pub repo: Option<RepoId>,

    /// Suppress progress bars.
    #[arg(long)]
    pub quiet: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config = Config::load(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;

        if let Some(repo) = &self.repo {
            if !config.repositories.contains(repo) {
                bail!("repository '{repo}' is not in the configuration");
            }
            config.repositories.retain(|r| r == repo);
        }

        // The only fatal filesystem failure: without a downloads root there
        // is no sandbox to work in.
        std::fs::create_dir_all(&config.downloads_root).with_context(|| {
            format!(
                "failed to create downloads root {}",
                config.downloads_root.display()
            )
        })?;

        let host = GithubHost::new(
            config.effective_token(),
            config.timeout(),
            config.proxy.as_deref(),
        );
        let sink: Box<dyn ProgressSink> = if self.quiet {
            Box::new(NullProgress)
        } else {
            Box::new(BarProgress)
        };

        let engine = SyncEngine::new(&config, &host, sink.as_ref());
        let reports = engine.run();

        if reports.is_empty() {
            println!("No repositories configured.");
            return Ok(());
        }
        for report in &reports {
            print_report(report);
        }
        Ok(())
    }
}

fn print_report(report: &RepoReport) {
    let repo = report.repo.as_str();
    match &report.outcome {
        CycleOutcome::Updated { tag, assets_failed } if *assets_failed == 0 => {
            println!("{} {repo} — mirrored {tag}", "✓".green());
        }
        CycleOutcome::Updated { tag, assets_failed } => {
            println!(
                "{} {repo} — mirrored {tag} ({assets_failed} asset(s) failed)",
                "✓".yellow()
            );
        }
        CycleOutcome::Unchanged { tag } => {
            println!("{} {repo} — up to date at {tag}", "·".dimmed());
        }
        CycleOutcome::Skipped { reason } => {
            println!("{} {repo} — skipped: {reason}", "·".dimmed());
        }
        CycleOutcome::Failed { reason } => {
            println!("{} {repo} — failed: {reason}", "✗".red());
        }
    }
}
