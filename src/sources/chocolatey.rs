//! Chocolatey source.

use std::sync::Arc;
use std::time::Duration;

use super::{AdapterScan, SourceAdapter};
use crate::package::{looks_like_id, PackageRecord, Source};
use crate::shell::CommandRunner;

/// Program name of Chocolatey.
pub const CHOCO: &str = "choco";

/// `choco outdated` exits 2 when upgrades are available.
const ACCEPTED_EXIT_CODES: [i32; 2] = [0, 2];

/// Upgrades offered by Chocolatey.
pub struct ChocolateySource {
    runner: Arc<dyn CommandRunner>,
}

impl ChocolateySource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Parse `choco outdated -r` output: `name|installed|available|pinned`.
pub fn parse_outdated(text: &str) -> Vec<PackageRecord> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('|').map(str::trim).collect();
            if parts.len() < 3 || !looks_like_id(parts[0]) {
                return None;
            }
            Some(
                PackageRecord::new(parts[0], parts[0], Source::SecondaryA)
                    .with_installed(parts[1])
                    .with_available(parts[2]),
            )
        })
        .collect()
}

impl SourceAdapter for ChocolateySource {
    fn source(&self) -> Source {
        Source::SecondaryA
    }

    fn name(&self) -> &str {
        CHOCO
    }

    fn scan(&self, budget: Duration) -> AdapterScan {
        if !self.runner.is_available(CHOCO) {
            return AdapterScan::failed();
        }

        let out = self
            .runner
            .run_captured_with_timeout(&[CHOCO, "outdated", "-r"], budget);
        if out.timed_out {
            tracing::warn!("choco outdated timed out");
            return AdapterScan::failed();
        }
        if !ACCEPTED_EXIT_CODES.contains(&out.exit_code) {
            tracing::warn!(exit_code = out.exit_code, "choco outdated failed");
            return AdapterScan::failed();
        }

        AdapterScan::ok(parse_outdated(&out.text))
    }
}
