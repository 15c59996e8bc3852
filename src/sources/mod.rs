//! Package sources.
//!
//! Each source wraps one external tool and turns its output into
//! [`PackageRecord`]s. Sources fail soft: a missing tool, a non-zero exit
//! or unparseable output yields an empty scan, never an error.
//!
//! - [`winget`] - primary package manager
//! - [`chocolatey`], [`scoop`] - secondary package managers
//! - [`registry`], [`store`] - installed baselines
//! - [`web`] - vendor page rules applied to baselines

pub mod chocolatey;
pub mod registry;
pub mod scoop;
pub mod store;
pub mod web;
pub mod winget;

pub use chocolatey::ChocolateySource;
pub use registry::RegistrySource;
pub use scoop::ScoopSource;
pub use store::StoreSource;
pub use web::{FetchedPages, HttpFetcher, PageFetcher, WebRule, WebRules};
pub use winget::WingetSource;

use std::sync::Arc;
use std::time::Duration;

use crate::config::SourceToggles;
use crate::package::{PackageRecord, Source};
use crate::shell::CommandRunner;

/// What a source's records are used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Records offering a newer version.
    Candidates,
    /// Installed software without an offered version.
    Baselines,
}

/// Result of scanning one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterScan {
    pub records: Vec<PackageRecord>,
    /// The tool was present and answered.
    pub ok: bool,
}

impl AdapterScan {
    /// A source that answered.
    pub fn ok(records: Vec<PackageRecord>) -> Self {
        Self { records, ok: true }
    }

    /// A source that was missing or errored.
    pub fn failed() -> Self {
        Self {
            records: Vec::new(),
            ok: false,
        }
    }
}

/// One origin of package observations.
pub trait SourceAdapter: Send + Sync {
    /// Tag for the records this source emits.
    fn source(&self) -> Source;

    /// Human-readable name for progress and logs.
    fn name(&self) -> &str;

    /// What the records are used for.
    fn role(&self) -> SourceRole {
        SourceRole::Candidates
    }

    /// Query the source, spending at most `budget` on external commands.
    fn scan(&self, budget: Duration) -> AdapterScan;
}

/// Sources enabled by `toggles`, in scan order.
///
/// Registry and store sources only exist on Windows.
pub fn default_adapters(
    toggles: &SourceToggles,
    runner: Arc<dyn CommandRunner>,
) -> Vec<Arc<dyn SourceAdapter>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if toggles.winget {
        adapters.push(Arc::new(WingetSource::new(Arc::clone(&runner))));
    }
    if toggles.choco {
        adapters.push(Arc::new(ChocolateySource::new(Arc::clone(&runner))));
    }
    if toggles.scoop {
        adapters.push(Arc::new(ScoopSource::new(Arc::clone(&runner))));
    }
    if cfg!(windows) {
        if toggles.registry {
            adapters.push(Arc::new(RegistrySource::new(Arc::clone(&runner))));
        }
        if toggles.store {
            adapters.push(Arc::new(StoreSource::new(Arc::clone(&runner))));
        }
    }

    adapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ScriptedRunner;

    #[test]
    fn default_adapters_follow_toggles() {
        let runner: Arc<dyn CommandRunner> = Arc::new(ScriptedRunner::new());
        let toggles = SourceToggles {
            choco: false,
            ..Default::default()
        };
        let adapters = default_adapters(&toggles, runner);
        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();

        assert_eq!(names[0], "winget");
        assert!(!names.contains(&"choco"));
        assert!(names.contains(&"scoop"));
        assert_eq!(names.contains(&"registry"), cfg!(windows));
    }

    #[test]
    fn adapter_scan_constructors() {
        assert!(AdapterScan::ok(vec![]).ok);
        let failed = AdapterScan::failed();
        assert!(!failed.ok);
        assert!(failed.records.is_empty());
    }
}
