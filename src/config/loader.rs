//! Settings file loading.

use crate::config::schema::Settings;
use crate::error::{Result, UpkeepError};
use std::fs;
use std::path::Path;

/// Load a settings file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            UpkeepError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            UpkeepError::Io(e)
        }
    })?;

    parse_settings(&content, path)
}

/// Parse YAML content into Settings.
///
/// An empty document yields the defaults.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| UpkeepError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load settings with optional path override.
///
/// An explicit path must exist. Without one, the default location is read
/// if present and defaults are used otherwise.
pub fn load_settings(config_override: Option<&Path>) -> Result<Settings> {
    if let Some(path) = config_override {
        return load_settings_file(path);
    }

    let path = super::default_config_path();
    if path.exists() {
        load_settings_file(&path)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Ok(Settings::default())
    }
}
