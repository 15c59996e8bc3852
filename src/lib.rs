//! upkeep - package update discovery and application.
//!
//! upkeep asks every installed package manager which packages have newer
//! versions, merges their answers into one deduplicated list and applies
//! updates through a per-package fallback chain.
//!
//! # Modules
//!
//! - [`cache`] - Time-limited cache of the last merged scan
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings loading and validation
//! - [`error`] - Error types and result aliases
//! - [`package`] - Package records and tool output parsing
//! - [`scan`] - Concurrent multi-source scanning
//! - [`shell`] - External process execution
//! - [`silent`] - Silent-install capability probing
//! - [`sources`] - Per-package-manager adapters
//! - [`ui`] - Spinners, tables and terminal styling
//! - [`update`] - The update fallback chain and run reports
//!
//! # Example
//!
//! ```
//! use upkeep::package::{parse_table, Source};
//!
//! let output = "\
//! Name        Id          Version  Available  Source
//! ---------------------------------------------------
//! Vendor App  Vendor.App  1.0.0    1.2.0      winget
//! ";
//! let rows = parse_table(output);
//! assert_eq!(rows[0].id, "Vendor.App");
//! assert_eq!(rows[0].source, Source::PrimaryPm);
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod package;
pub mod scan;
pub mod shell;
pub mod silent;
pub mod sources;
pub mod ui;
pub mod update;

pub use error::{Result, UpkeepError};
pub use package::{PackageRecord, Source};
pub use scan::Scanner;
pub use update::{UpdateExecutor, UpdateOutcomeSet};
