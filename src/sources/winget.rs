//! Primary package manager source (winget).

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{AdapterScan, SourceAdapter};
use crate::package::{parse_json_listing, parse_table, PackageRecord, Source};
use crate::shell::CommandRunner;

/// Program name of the primary package manager.
pub const WINGET: &str = "winget";

/// Flags that keep winget from prompting.
pub const AGREEMENT_FLAGS: [&str; 2] = [
    "--accept-source-agreements",
    "--accept-package-agreements",
];

const JSON_QUERY: &[&str] = &[
    WINGET,
    "upgrade",
    "--include-unknown",
    "--accept-source-agreements",
    "--accept-package-agreements",
    "--disable-interactivity",
    "--output",
    "json",
];

/// Plain-table fallbacks, tried in order until one yields rows.
const TABLE_QUERIES: &[&[&str]] = &[
    &[WINGET, "upgrade"],
    &[WINGET, "upgrade", "--include-unknown"],
    &[WINGET, "upgrade", "--source", WINGET],
];

/// Upgrades offered by winget.
pub struct WingetSource {
    runner: Arc<dyn CommandRunner>,
}

impl WingetSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn json_listing(&self, timeout: Duration) -> Option<Vec<PackageRecord>> {
        let out = self.runner.run_captured_with_timeout(JSON_QUERY, timeout);
        if !out.success() || out.text.trim().is_empty() {
            return None;
        }
        parse_json_listing(&out.text).filter(|rows| !rows.is_empty())
    }
}

impl SourceAdapter for WingetSource {
    fn source(&self) -> Source {
        Source::PrimaryPm
    }

    fn name(&self) -> &str {
        WINGET
    }

    fn scan(&self, budget: Duration) -> AdapterScan {
        if !self.runner.is_available(WINGET) {
            tracing::debug!("winget not found, skipping");
            return AdapterScan::failed();
        }

        let deadline = Instant::now() + budget;
        if let Some(rows) = self.json_listing(budget) {
            return AdapterScan::ok(rows);
        }

        let mut answered = false;
        for query in TABLE_QUERIES {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("winget scan ran out of time");
                break;
            }
            let out = self.runner.run_captured_with_timeout(query, remaining);
            if out.timed_out {
                tracing::warn!(command = %query.join(" "), "winget query timed out");
                break;
            }
            answered |= out.success();
            let rows = parse_table(&out.text);
            if !rows.is_empty() {
                return AdapterScan::ok(rows);
            }
        }

        if answered {
            AdapterScan::ok(Vec::new())
        } else {
            tracing::warn!("winget returned no usable output");
            AdapterScan::failed()
        }
    }
}
