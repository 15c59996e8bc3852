//! Command-line interface.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{CacheArgs, CacheSubcommand, Cli, Commands, ScanArgs, UpdateArgs};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
