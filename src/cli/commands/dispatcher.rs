//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandContext`] for state shared by every command
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{ScanCache, CACHE_FILE_NAME};
use crate::cli::args::{Cli, Commands};
use crate::config::{default_config_dir, default_config_path, load_settings, validate, Settings};
use crate::error::Result;
use crate::shell::{CommandRunner, OutputCallback, SystemRunner};
use crate::ui::Theme;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, writing user-facing output to `out`.
    fn execute(&self, ctx: &CommandContext, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Settings and paths resolved once per invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    /// Directory holding the cache and the default rules file.
    pub data_dir: PathBuf,
    pub dry_run: bool,
    pub theme: Theme,
}

impl CommandContext {
    /// Load and validate settings for `cli`.
    ///
    /// With `--config`, the cache and rules file sit next to that file.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let settings = load_settings(cli.config.as_deref())?;
        validate(&settings)?;

        let config_path = cli.config.clone().unwrap_or_else(default_config_path);
        let data_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_dir);

        let dry_run = cli.dry_run || settings.dry_run;
        Ok(Self::new(settings, data_dir).with_dry_run(dry_run))
    }

    pub fn new(settings: Settings, data_dir: PathBuf) -> Self {
        Self {
            settings,
            data_dir,
            dry_run: false,
            theme: Theme::detect(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// The scan cache under the data directory.
    pub fn cache(&self) -> ScanCache {
        ScanCache::new(self.data_dir.join(CACHE_FILE_NAME), self.settings.cache_ttl())
    }

    /// Web rules file for this configuration.
    pub fn rules_path(&self) -> PathBuf {
        self.settings.rules_path(&self.data_dir)
    }

    /// A process runner honouring dry-run.
    pub fn runner(&self, on_line: Option<OutputCallback>) -> Arc<dyn CommandRunner> {
        let mut runner = SystemRunner::new().with_dry_run(self.dry_run);
        if let Some(callback) = on_line {
            runner = runner.with_output(callback);
        }
        Arc::new(runner)
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    ctx: CommandContext,
}

impl CommandDispatcher {
    pub fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, command: &Commands, out: &mut dyn Write) -> Result<CommandResult> {
        match command {
            Commands::Scan(args) => super::scan::ScanCommand::new(args.clone()).execute(&self.ctx, out),
            Commands::Update(args) => {
                super::update::UpdateCommand::new(args.clone()).execute(&self.ctx, out)
            }
            Commands::Cache(args) => super::cache::CacheCommand::new(args.clone()).execute(&self.ctx, out),
        }
    }
}
