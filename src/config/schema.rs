//! Settings schema.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_cache_ttl_minutes() -> u64 {
    10
}

fn default_scan_timeout_secs() -> u64 {
    45
}

fn default_true() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// User settings, read from `config.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How long a scan result is reused.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    /// Wall-clock budget for each source during a scan.
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    /// Leave store apps out of scan results.
    #[serde(default = "default_true")]
    pub skip_store_scan: bool,

    /// Ignore the cache on every scan.
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_refresh: bool,

    /// Log commands instead of running them.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dry_run: bool,

    /// Web version rules file (defaults to `web_version_rules.json` next to
    /// the config file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_rules_path: Option<PathBuf>,

    /// Per-source toggles.
    pub sources: SourceToggles,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
            scan_timeout_secs: default_scan_timeout_secs(),
            skip_store_scan: true,
            force_refresh: false,
            dry_run: false,
            web_rules_path: None,
            sources: SourceToggles::default(),
        }
    }
}

impl Settings {
    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }

    /// Per-source scan budget as a duration.
    pub fn scan_budget(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Web rules file, resolved against `config_dir` when unset or relative.
    pub fn rules_path(&self, config_dir: &Path) -> PathBuf {
        match &self.web_rules_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => config_dir.join(p),
            None => config_dir.join(super::RULES_FILE_NAME),
        }
    }
}

/// Which sources take part in a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    pub winget: bool,
    pub choco: bool,
    pub scoop: bool,
    /// Only registered on Windows.
    pub registry: bool,
    /// Only registered on Windows.
    pub store: bool,
    pub web: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            winget: true,
            choco: true,
            scoop: true,
            registry: true,
            store: true,
            web: true,
        }
    }
}
