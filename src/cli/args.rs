//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::update::ReportFormat;

/// upkeep - find and apply package updates across package managers.
#[derive(Debug, Parser)]
#[command(name = "upkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (cache and rules live next to it)
    #[arg(short, long, global = true, env = "UPKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List upgradable packages
    Scan(ScanArgs),

    /// Update packages by identifier
    Update(UpdateArgs),

    /// Inspect or clear the scan cache
    Cache(CacheArgs),
}

/// Arguments for the `scan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScanArgs {
    /// Ignore the cached scan
    #[arg(long)]
    pub refresh: bool,

    /// Include store apps
    #[arg(long)]
    pub include_store: bool,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    /// Package identifiers to update
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Write a run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub format: ReportFormat,
}

/// Arguments for the `cache` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// Show the cached scan and its age
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the cached scan
    Clear,
}
