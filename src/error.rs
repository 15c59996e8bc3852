//! Error types for upkeep operations.
//!
//! This module defines [`UpkeepError`], the error type used by the fallible
//! plumbing (settings, cache, rules, reports), and a [`Result`] alias.
//!
//! # Error Handling Strategy
//!
//! - Scanning and applying updates never fail as a whole: source and
//!   strategy failures are logged and degrade to empty results or a
//!   `failed` classification
//! - Use `UpkeepError` for errors that reach the command line
//! - Use `anyhow::Error` (via `UpkeepError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for upkeep operations.
#[derive(Debug, Error)]
pub enum UpkeepError {
    /// Settings file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the settings file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid settings values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// The scan cache could not be read or written.
    #[error("Cache error at {path}: {message}")]
    Cache { path: PathBuf, message: String },

    /// The web version rules file is unusable.
    #[error("Invalid web version rules at {path}: {message}")]
    Rules { path: PathBuf, message: String },

    /// A run report could not be written.
    #[error("Failed to write report to {path}: {message}")]
    Report { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for upkeep operations.
pub type Result<T> = std::result::Result<T, UpkeepError>;
