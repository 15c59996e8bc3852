//! Settings loading and validation.
//!
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use upkeep::config::{parse_settings, validate};
//! use std::path::Path;
//!
//! let settings = parse_settings("cache_ttl_minutes: 60", Path::new("config.yml")).unwrap();
//! validate(&settings).unwrap();
//! assert_eq!(settings.cache_ttl_minutes, 60);
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_settings, load_settings_file, parse_settings};
pub use schema::{Settings, SourceToggles};
pub use validator::{validate, validate_settings, ValidationError};

use std::path::PathBuf;

/// File name of the settings file.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// File name of the web version rules.
pub const RULES_FILE_NAME: &str = "web_version_rules.json";

/// Directory holding settings, rules and the scan cache.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("upkeep")
}

/// Default settings file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}
