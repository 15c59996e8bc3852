//! Scoop source.

use std::sync::Arc;
use std::time::Duration;

use super::{AdapterScan, SourceAdapter};
use crate::package::{PackageRecord, Source};
use crate::shell::CommandRunner;

/// Program name of Scoop.
pub const SCOOP: &str = "scoop";

/// Upgrades offered by Scoop.
pub struct ScoopSource {
    runner: Arc<dyn CommandRunner>,
}

impl ScoopSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Parse `scoop status` output.
///
/// Lines look like `git  2.40.0 -> 2.44.0`; the installed version is not
/// reliably positioned, so only the name and the text after the last
/// arrow are kept.
pub fn parse_status(text: &str) -> Vec<PackageRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains("->"))
        .filter(|line| !line.to_lowercase().contains("is up to date"))
        .filter_map(|line| {
            let name = line.split_whitespace().next()?;
            let available = line.rsplit("->").next()?.trim();
            Some(PackageRecord::new(name, name, Source::SecondaryB).with_available(available))
        })
        .collect()
}

impl SourceAdapter for ScoopSource {
    fn source(&self) -> Source {
        Source::SecondaryB
    }

    fn name(&self) -> &str {
        SCOOP
    }

    fn scan(&self, budget: Duration) -> AdapterScan {
        if !self.runner.is_available(SCOOP) {
            return AdapterScan::failed();
        }

        let out = self
            .runner
            .run_captured_with_timeout(&[SCOOP, "status"], budget);
        if out.timed_out {
            tracing::warn!("scoop status timed out");
            return AdapterScan::failed();
        }

        AdapterScan::ok(parse_status(&out.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ScriptedRunner;

    #[test]
    fn parses_arrow_lines() {
        let text = "\
Scoop is up to date.
git         2.40.0 -> 2.44.0
nodejs-lts  20.1.0 -> 20.11.1
Everything is ok!
";
        let rows = parse_status(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "git");
        assert_eq!(rows[0].name, "git");
        assert_eq!(rows[0].available_version, "2.44.0");
        assert!(rows[0].installed_version.is_empty());
        assert_eq!(rows[1].source, Source::SecondaryB);
    }

    #[test]
    fn up_to_date_lines_with_arrows_are_skipped() {
        let rows = parse_status("git -> is up to date\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn scan_runs_status() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .with_programs(&[SCOOP])
                .on(&[SCOOP, "status"], 0, "git 2.40.0 -> 2.44.0\n"),
        );
        let scan = ScoopSource::new(runner.clone()).scan(Duration::from_secs(5));
        assert!(scan.ok);
        assert_eq!(scan.records.len(), 1);
        assert_eq!(runner.command_lines(), vec!["scoop status"]);
    }
}
