//! Relvault — GitHub release mirroring CLI.
//!
//! # Usage
//!
//! ```text
//! relvault sync [--config <path>] [--repo <owner/name>] [--quiet]
//! relvault status [--config <path>] [--json]
//! ```
//!
//! `sync` mirrors the latest tagged release (source archive + assets) of
//! each configured repository into the downloads root, keeping at most
//! `keep_count` versions per repository. `status` reads only local state.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{status::StatusArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "relvault",
    version,
    about = "Mirror the latest GitHub releases into a local vault",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll configured repositories and mirror new releases.
    Sync(SyncArgs),

    /// Show committed versions and on-disk version directories.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
