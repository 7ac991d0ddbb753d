//! # relvault-core
//!
//! Domain types and run configuration for Relvault.
//!
//! The sync engine (`relvault-sync`) and the CLI both consume the types here;
//! nothing in this crate performs network I/O.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{AssetRef, ReleaseInfo, RepoId};
