//! Per-package update fallback chain.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::index::SourceIndex;
use super::outcome::{Outcome, UpdateOutcomeSet};
use super::report::UpdateRun;
use crate::cache::ScanCache;
use crate::package::{looks_like_id, looks_like_version, parse_table, Source};
use crate::shell::{is_elevated, CommandRunner};
use crate::sources::chocolatey::CHOCO;
use crate::sources::scoop::SCOOP;
use crate::sources::winget::{AGREEMENT_FLAGS, WINGET};

/// Installer exit code meaning success with a reboot pending.
pub const REBOOT_REQUIRED_EXIT_CODE: i32 = 3010;

/// Exit codes treated as success for winget strategies.
pub const SUCCESS_EXIT_CODES: [i32; 2] = [0, REBOOT_REQUIRED_EXIT_CODE];

/// Applies updates one identifier at a time.
///
/// For each identifier the chain stops at the first strategy that works:
/// silent upgrade, interactive upgrade, reinstall, then the secondary
/// package manager that lists the package.
pub struct UpdateExecutor {
    runner: Arc<dyn CommandRunner>,
    cache: Option<ScanCache>,
    elevated: bool,
    lookup_timeout: Duration,
}

/// Mutable state of one run.
#[derive(Default)]
struct RunState {
    outcomes: UpdateOutcomeSet,
    reboot_required: bool,
    notes: Vec<String>,
}

impl UpdateExecutor {
    /// Create an executor for the current privilege context.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            cache: None,
            elevated: is_elevated(),
            lookup_timeout: Duration::from_secs(45),
        }
    }

    /// Use the last scan to learn which source each identifier came from.
    pub fn with_cache(mut self, cache: ScanCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the detected privilege context.
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Time limit for the initial `winget upgrade` lookup.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Apply updates and partition the identifiers by outcome.
    pub fn apply(&self, ids: &[String]) -> UpdateOutcomeSet {
        self.execute(ids).outcomes
    }

    /// Apply updates and produce a full run report.
    pub fn run(&self, ids: &[String]) -> UpdateRun {
        let started_at = Utc::now();
        let state = self.execute(ids);
        UpdateRun {
            started_at,
            finished_at: Some(Utc::now()),
            outcomes: state.outcomes,
            reboot_required: state.reboot_required,
            notes: state.notes,
        }
    }

    fn execute(&self, ids: &[String]) -> RunState {
        let mut state = RunState::default();
        let winget = self.runner.is_available(WINGET);
        let index = self.source_index(winget);

        for id in ids {
            let outcome = self.update_one(id, &index, winget, &mut state);
            match outcome {
                Outcome::Failed => tracing::warn!(id = %id, "Update failed"),
                outcome => tracing::info!(id = %id, %outcome, "Update finished"),
            }
            state.outcomes.record(id, outcome);
        }
        state
    }

    /// Sources known for each identifier: cached rows of any age, then a
    /// live `winget upgrade` listing.
    pub fn source_index(&self, winget_available: bool) -> SourceIndex {
        let mut index = SourceIndex::new();
        if let Some(entry) = self.cache.as_ref().and_then(ScanCache::read_any) {
            index.extend(&entry.rows);
        }
        if winget_available {
            let out = self
                .runner
                .run_captured_with_timeout(&[WINGET, "upgrade"], self.lookup_timeout);
            if out.success() {
                index.extend(&parse_table(&out.text));
            } else {
                tracing::debug!(exit_code = out.exit_code, "winget upgrade lookup failed");
            }
        }
        index
    }

    fn update_one(
        &self,
        id: &str,
        index: &SourceIndex,
        winget: bool,
        state: &mut RunState,
    ) -> Outcome {
        if id.starts_with("web:") || !looks_like_id(id) || looks_like_version(id) {
            tracing::warn!(id, "Skipping invalid identifier");
            return Outcome::Skipped;
        }

        let store = index.is_store(id);
        if store && self.elevated {
            state.notes.push(format!(
                "{} is a store app; run from a non-elevated terminal to update it",
                id
            ));
            return Outcome::StoreSkipped;
        }

        if winget {
            if self.winget_strategy(&silent_upgrade(id, store), state) {
                return Outcome::Updated;
            }
            if store {
                state
                    .notes
                    .push(format!("{}: store update failed; update it from the store library", id));
                return Outcome::Failed;
            }
            tracing::info!(id, "Retrying interactively");
            if self.winget_strategy(&interactive_upgrade(id), state) {
                return Outcome::Interactive;
            }
            tracing::info!(id, "Trying reinstall");
            if self.winget_strategy(&reinstall(id), state) {
                return Outcome::Reinstalled;
            }
        } else if store {
            return Outcome::Failed;
        }

        match index.secondary(id) {
            Some(source) if self.secondary_upgrade(id, source) => Outcome::Updated,
            _ => Outcome::Failed,
        }
    }

    fn winget_strategy(&self, argv: &[String], state: &mut RunState) -> bool {
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        let code = self.runner.run_streamed(&argv);
        if code == REBOOT_REQUIRED_EXIT_CODE {
            state.reboot_required = true;
        }
        SUCCESS_EXIT_CODES.contains(&code)
    }

    fn secondary_upgrade(&self, id: &str, source: Source) -> bool {
        let argv: Vec<&str> = match source {
            Source::SecondaryA => vec![CHOCO, "upgrade", id, "-y"],
            Source::SecondaryB => vec![SCOOP, "update", id],
            _ => return false,
        };
        if !self.runner.is_available(argv[0]) {
            return false;
        }
        tracing::info!(id, manager = argv[0], "Trying secondary package manager");
        self.runner.run_streamed(&argv) == 0
    }
}

fn upgrade_base(id: &str) -> Vec<String> {
    let mut argv: Vec<String> = [WINGET, "upgrade", "--id", id]
        .iter()
        .map(|s| s.to_string())
        .collect();
    argv.extend(AGREEMENT_FLAGS.iter().map(|s| s.to_string()));
    argv
}

/// `winget upgrade --id <id> <agreements> [--source msstore] --disable-interactivity --silent`
pub fn silent_upgrade(id: &str, store: bool) -> Vec<String> {
    let mut argv = upgrade_base(id);
    if store {
        argv.extend(["--source".to_string(), "msstore".to_string()]);
    }
    argv.extend(["--disable-interactivity".to_string(), "--silent".to_string()]);
    argv
}

/// The silent upgrade with its quiet switches replaced by `--interactive`.
pub fn interactive_upgrade(id: &str) -> Vec<String> {
    let mut argv: Vec<String> = silent_upgrade(id, false)
        .into_iter()
        .filter(|a| a != "--silent" && a != "--disable-interactivity")
        .collect();
    argv.push("--interactive".to_string());
    argv
}

/// `winget install --id <id> <agreements> --silent`
pub fn reinstall(id: &str) -> Vec<String> {
    let mut argv: Vec<String> = [WINGET, "install", "--id", id]
        .iter()
        .map(|s| s.to_string())
        .collect();
    argv.extend(AGREEMENT_FLAGS.iter().map(|s| s.to_string()));
    argv.push("--silent".to_string());
    argv
}
