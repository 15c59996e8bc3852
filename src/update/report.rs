//! Update run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::outcome::{Outcome, UpdateOutcomeSet};
use crate::error::{Result, UpkeepError};

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

/// Everything that happened during one update run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub outcomes: UpdateOutcomeSet,
    /// An installer asked for a reboot.
    pub reboot_required: bool,
    pub notes: Vec<String>,
}

impl UpdateRun {
    /// Start an empty run now.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: UpdateOutcomeSet::default(),
            reboot_required: false,
            notes: Vec::new(),
        }
    }

    /// Stamp the finish time.
    pub fn mark_finished(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?)
    }

    /// Plain-text report, one section per outcome.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "upkeep run report");
        let _ = writeln!(out, "Started:  {}", self.started_at.to_rfc3339());
        let _ = writeln!(
            out,
            "Finished: {}",
            self.finished_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );
        let _ = writeln!(out, "Reboot required: {}", self.reboot_required);
        out.push('\n');

        for outcome in Outcome::ALL {
            let ids = self.outcomes.bucket(outcome);
            if ids.is_empty() {
                let _ = writeln!(out, "{} (none)", outcome.title());
            } else {
                let _ = writeln!(out, "{}", outcome.title());
                for id in ids {
                    let _ = writeln!(out, "  - {}", id);
                }
            }
            out.push('\n');
        }

        if !self.notes.is_empty() {
            let _ = writeln!(out, "Notes");
            for note in &self.notes {
                let _ = writeln!(out, "  - {}", note);
            }
        }
        out
    }

    /// Render in `format`.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Write the report to `path`, creating parent directories.
    pub fn save(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let report_error = |message: String| UpkeepError::Report {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| report_error(e.to_string()))?;
        }
        let content = self.render(format)?;
        fs::write(path, content).map_err(|e| report_error(e.to_string()))?;
        tracing::info!(path = %path.display(), "Report saved");
        Ok(())
    }
}

impl Default for UpdateRun {
    fn default() -> Self {
        Self::new()
    }
}
