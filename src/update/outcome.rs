//! Update outcome classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where one requested identifier ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Silent upgrade, or a secondary manager's upgrade, succeeded.
    Updated,
    /// Succeeded only with the installer's UI.
    Interactive,
    /// Upgrade failed but a fresh install succeeded.
    Reinstalled,
    /// Not an installable identifier.
    Skipped,
    /// Store app requested from an elevated context.
    StoreSkipped,
    /// Every strategy failed.
    Failed,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Updated,
        Outcome::Interactive,
        Outcome::Reinstalled,
        Outcome::Skipped,
        Outcome::StoreSkipped,
        Outcome::Failed,
    ];

    /// Section title in reports.
    pub fn title(&self) -> &'static str {
        match self {
            Outcome::Updated => "Updated",
            Outcome::Interactive => "Updated (interactive)",
            Outcome::Reinstalled => "Reinstalled",
            Outcome::Skipped => "Skipped",
            Outcome::StoreSkipped => "Store skipped (elevated context)",
            Outcome::Failed => "Failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Requested identifiers partitioned by outcome.
///
/// Every requested identifier lands in exactly one bucket, in request
/// order; a repeated identifier is classified once per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcomeSet {
    pub updated: Vec<String>,
    pub interactive: Vec<String>,
    pub reinstalled: Vec<String>,
    pub skipped: Vec<String>,
    pub store_skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl UpdateOutcomeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `id` under `outcome`.
    pub fn record(&mut self, id: &str, outcome: Outcome) {
        self.bucket_mut(outcome).push(id.to_string());
    }

    fn bucket_mut(&mut self, outcome: Outcome) -> &mut Vec<String> {
        match outcome {
            Outcome::Updated => &mut self.updated,
            Outcome::Interactive => &mut self.interactive,
            Outcome::Reinstalled => &mut self.reinstalled,
            Outcome::Skipped => &mut self.skipped,
            Outcome::StoreSkipped => &mut self.store_skipped,
            Outcome::Failed => &mut self.failed,
        }
    }

    /// Identifiers filed under `outcome`.
    pub fn bucket(&self, outcome: Outcome) -> &[String] {
        match outcome {
            Outcome::Updated => &self.updated,
            Outcome::Interactive => &self.interactive,
            Outcome::Reinstalled => &self.reinstalled,
            Outcome::Skipped => &self.skipped,
            Outcome::StoreSkipped => &self.store_skipped,
            Outcome::Failed => &self.failed,
        }
    }

    /// Total identifiers across all buckets.
    pub fn len(&self) -> usize {
        Outcome::ALL.iter().map(|o| self.bucket(*o).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Updated, interactively updated or reinstalled.
    pub fn succeeded(&self) -> usize {
        self.updated.len() + self.interactive.len() + self.reinstalled.len()
    }

    /// Whether nothing failed.
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}
