//! Scan result caching.
//!
//! The last merged scan is kept in a single JSON file and reused while it
//! is younger than the configured TTL.

pub mod entry;
pub mod store;

pub use entry::{unix_now, CacheEntry};
pub use store::ScanCache;

use std::path::PathBuf;
use std::time::Duration;

/// File name of the scan cache inside the config directory.
pub const CACHE_FILE_NAME: &str = "last-upgrades.json";

/// Get the default cache file path.
pub fn default_cache_path() -> PathBuf {
    crate::config::default_config_dir().join(CACHE_FILE_NAME)
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs >= 86400 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
