//! Per-scan diagnostics.

use serde::Serialize;
use std::fmt;

use crate::package::Source;

/// How one source fared during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    /// The source answered.
    Ok,
    /// The tool was missing, errored or panicked.
    Failed,
    /// The source missed the scan deadline and was abandoned.
    TimedOut,
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdapterStatus::Ok => "ok",
            AdapterStatus::Failed => "failed",
            AdapterStatus::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// One source's contribution to a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterReport {
    pub name: String,
    pub source: Source,
    pub status: AdapterStatus,
    /// Records the source returned, before filtering.
    pub records: usize,
}

/// What happened during a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Rows came from a fresh cache; no source ran.
    pub from_cache: bool,
    pub adapters: Vec<AdapterReport>,
    /// Package manager candidates kept after filtering.
    pub candidates: usize,
    /// Baselines handed to the vendor page rules.
    pub baselines: usize,
    /// Candidates synthesized from vendor pages.
    pub web_candidates: usize,
    /// Rows returned after deduplication.
    pub total: usize,
}

impl ScanReport {
    /// A scan answered from the cache.
    pub fn cached(total: usize) -> Self {
        Self {
            from_cache: true,
            total,
            ..Default::default()
        }
    }

    /// Sources that did not answer.
    pub fn degraded(&self) -> impl Iterator<Item = &AdapterReport> {
        self.adapters
            .iter()
            .filter(|a| a.status != AdapterStatus::Ok)
    }

    /// Log one line per source plus a summary.
    pub fn log(&self) {
        if self.from_cache {
            tracing::info!(rows = self.total, "Scan served from cache");
            return;
        }
        for adapter in &self.adapters {
            match adapter.status {
                AdapterStatus::Ok => tracing::info!(
                    source = %adapter.name,
                    records = adapter.records,
                    "Source scanned"
                ),
                status => tracing::warn!(source = %adapter.name, %status, "Source unavailable"),
            }
        }
        tracing::info!(
            candidates = self.candidates,
            baselines = self.baselines,
            web = self.web_candidates,
            total = self.total,
            "Scan complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_lists_non_ok_sources() {
        let report = ScanReport {
            adapters: vec![
                AdapterReport {
                    name: "winget".into(),
                    source: Source::PrimaryPm,
                    status: AdapterStatus::Ok,
                    records: 3,
                },
                AdapterReport {
                    name: "choco".into(),
                    source: Source::SecondaryA,
                    status: AdapterStatus::TimedOut,
                    records: 0,
                },
            ],
            ..Default::default()
        };
        let degraded: Vec<&str> = report.degraded().map(|a| a.name.as_str()).collect();
        assert_eq!(degraded, vec!["choco"]);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(AdapterStatus::TimedOut).unwrap(), "timed_out");
        assert_eq!(AdapterStatus::TimedOut.to_string(), "timed out");
    }

    #[test]
    fn cached_report() {
        let report = ScanReport::cached(4);
        assert!(report.from_cache);
        assert_eq!(report.total, 4);
        assert!(report.adapters.is_empty());
    }
}
