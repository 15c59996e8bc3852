//! Scan orchestration.
//!
//! A scan checks the cache, fans out to every source on its own thread,
//! filters and merges what comes back, adds vendor page candidates and
//! caches the result. It never fails: sources that error or overrun the
//! deadline contribute nothing.

pub mod report;

pub use report::{AdapterReport, AdapterStatus, ScanReport};

use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cache::ScanCache;
use crate::package::{looks_like_id, PackageRecord, Source};
use crate::shell::CommandRunner;
use crate::silent::SilentInstallProber;
use crate::sources::web::{web_candidates, HttpFetcher, PageFetcher, WebRules};
use crate::sources::winget::WINGET;
use crate::sources::{AdapterScan, SourceAdapter, SourceRole};

/// Extra time past the per-source budget before stragglers are abandoned.
pub const DEADLINE_GRACE: Duration = Duration::from_secs(5);

/// Progress callback: `(percent, stage, detail)`.
pub type ProgressFn = Arc<dyn Fn(u8, &str, &str) + Send + Sync>;

/// Concurrent multi-source scanner.
pub struct Scanner {
    runner: Arc<dyn CommandRunner>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    prober: Arc<SilentInstallProber>,
    cache: ScanCache,
    budget: Duration,
    grace: Duration,
    rules: WebRules,
    fetcher: Arc<dyn PageFetcher>,
    on_progress: Option<ProgressFn>,
}

impl Scanner {
    /// Create a scanner with no sources and no web rules.
    pub fn new(runner: Arc<dyn CommandRunner>, cache: ScanCache) -> Self {
        Self {
            prober: Arc::new(SilentInstallProber::new(Arc::clone(&runner))),
            runner,
            adapters: Vec::new(),
            cache,
            budget: Duration::from_secs(45),
            grace: DEADLINE_GRACE,
            rules: WebRules::default(),
            fetcher: Arc::new(HttpFetcher::new()),
            on_progress: None,
        }
    }

    /// Sources to scan, in merge order.
    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        self.adapters = adapters;
        self
    }

    /// Per-source time budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Time allowed past the budget before stragglers are abandoned.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Share a prober (and its memo) with other components.
    pub fn with_prober(mut self, prober: Arc<SilentInstallProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Vendor page rules and the fetcher used to apply them.
    pub fn with_web_rules(mut self, rules: WebRules, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.rules = rules;
        self.fetcher = fetcher;
        self
    }

    /// Receive progress updates.
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// The cache this scanner reads and writes.
    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    fn progress(&self, percent: u8, stage: &str, detail: &str) {
        if let Some(callback) = &self.on_progress {
            callback(percent, stage, detail);
        }
    }

    /// Upgradable packages across every source.
    pub fn scan(&self, force_refresh: bool, skip_store: bool) -> Vec<PackageRecord> {
        self.scan_with_report(force_refresh, skip_store).0
    }

    /// Like [`scan`](Self::scan), also reporting how each source fared.
    pub fn scan_with_report(
        &self,
        force_refresh: bool,
        skip_store: bool,
    ) -> (Vec<PackageRecord>, ScanReport) {
        if !force_refresh {
            if let Some(rows) = self.cache.read_fresh() {
                self.progress(100, "Done", "");
                let report = ScanReport::cached(rows.len());
                report.log();
                return (rows, report);
            }
        }

        self.progress(1, "Preparing", "");
        self.refresh_sources();

        let scans = self.fan_out();
        let mut report = ScanReport::default();

        self.progress(70, "Merging results", "");
        let check_deadline = Instant::now() + self.budget;
        let mut candidates = Vec::new();
        let mut baselines = Vec::new();
        for (adapter, (status, scan)) in self.adapters.iter().zip(scans) {
            report.adapters.push(AdapterReport {
                name: adapter.name().to_string(),
                source: adapter.source(),
                status,
                records: scan.records.len(),
            });
            match adapter.role() {
                SourceRole::Baselines => baselines.extend(scan.records),
                SourceRole::Candidates => candidates.extend(
                    scan.records
                        .into_iter()
                        .filter(|r| self.keep_candidate(r, skip_store, check_deadline)),
                ),
            }
        }
        report.candidates = candidates.len();
        report.baselines = baselines.len();

        self.progress(85, "Checking vendor pages", "Version rules");
        let known: HashSet<(String, Source)> = candidates
            .iter()
            .map(|r| (r.id.clone(), r.source))
            .collect();
        let web = web_candidates(
            &baselines,
            &known,
            skip_store,
            &self.rules,
            self.fetcher.as_ref(),
            |index, total, name| {
                let pct = 85 + (index * 10 / total.max(1)) as u8;
                self.progress(pct.min(95), "Checking vendor pages", name);
            },
        );
        report.web_candidates = web.len();
        candidates.extend(web);

        self.progress(96, "Deduplicating", "");
        let rows = dedupe(candidates);
        report.total = rows.len();

        if !rows.is_empty() {
            if let Err(e) = self.cache.write(&rows) {
                tracing::warn!("Failed to write scan cache: {}", e);
            }
        }

        self.progress(100, "Done", "");
        report.log();
        (rows, report)
    }

    /// Refresh winget's package index before querying it.
    fn refresh_sources(&self) {
        let wants_winget = self
            .adapters
            .iter()
            .any(|a| a.source() == Source::PrimaryPm);
        if !wants_winget || !self.runner.is_available(WINGET) {
            return;
        }
        self.progress(20, "Refreshing sources", WINGET);
        let out = self
            .runner
            .run_captured_with_timeout(&[WINGET, "source", "update"], self.budget);
        if !out.success() {
            tracing::warn!(
                exit_code = out.exit_code,
                timed_out = out.timed_out,
                "winget source update failed"
            );
        }
    }

    /// Run every adapter on its own thread and collect results until the
    /// deadline. Results come back in registration order.
    fn fan_out(&self) -> Vec<(AdapterStatus, AdapterScan)> {
        let total = self.adapters.len();
        let mut results: Vec<Option<(AdapterStatus, AdapterScan)>> = vec![None; total];
        let (tx, rx) = mpsc::channel();
        let mut pending = 0;

        for (index, adapter) in self.adapters.iter().enumerate() {
            let tx = tx.clone();
            let adapter = Arc::clone(adapter);
            let budget = self.budget;
            let spawned = thread::Builder::new()
                .name(format!("scan-{}", adapter.name()))
                .spawn(move || {
                    let scan = adapter.scan(budget);
                    let _ = tx.send((index, scan));
                });
            match spawned {
                Ok(_) => pending += 1,
                Err(e) => {
                    tracing::warn!("Failed to start scan worker: {}", e);
                    results[index] = Some((AdapterStatus::Failed, AdapterScan::failed()));
                }
            }
        }
        drop(tx);

        self.progress(30, "Scanning", "");
        let deadline = Instant::now() + self.budget + self.grace;
        let mut abandoned_status = AdapterStatus::Failed;
        let mut done = 0;
        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((index, scan)) => {
                    pending -= 1;
                    done += 1;
                    let status = if scan.ok {
                        AdapterStatus::Ok
                    } else {
                        AdapterStatus::Failed
                    };
                    let name = self.adapters[index].name();
                    tracing::debug!(source = name, records = scan.records.len(), "Source finished");
                    let pct = 30 + (done * 40 / total.max(1)) as u8;
                    self.progress(pct.min(69), "Scanning", name);
                    results[index] = Some((status, scan));
                }
                Err(RecvTimeoutError::Timeout) => {
                    abandoned_status = AdapterStatus::TimedOut;
                    break;
                }
                // A worker panicked without reporting.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| (abandoned_status, AdapterScan::failed())))
            .collect()
    }

    /// Silent-install checks share one budget, measured from `check_deadline`.
    fn keep_candidate(
        &self,
        record: &PackageRecord,
        skip_store: bool,
        check_deadline: Instant,
    ) -> bool {
        if !record.is_upgradable() {
            return false;
        }
        if skip_store && record.source == Source::Store {
            return false;
        }
        if record.source == Source::PrimaryPm {
            let remaining = check_deadline.saturating_duration_since(Instant::now());
            return looks_like_id(&record.id)
                && self.prober.supports_silent_within(&record.id, remaining);
        }
        true
    }
}

/// Drop repeated `(id, source)` pairs, keeping the first.
pub fn dedupe(rows: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert((r.id.clone(), r.source)))
        .collect()
}
