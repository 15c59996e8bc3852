//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`], which shares one [`CommandContext`] (settings,
//! data directory, dry-run) across subcommands.

pub mod cache;
pub mod dispatcher;
pub mod scan;
pub mod update;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
