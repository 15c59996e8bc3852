//! Installed store apps, as baselines.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::{AdapterScan, SourceAdapter, SourceRole};
use crate::package::{PackageRecord, Source};
use crate::shell::CommandRunner;

const POWERSHELL: &str = "powershell.exe";

const QUERY: &str = "Get-AppxPackage | Select Name,Version | ConvertTo-Json -Depth 3";

/// Parse `ConvertTo-Json` output: an array, or a single object when only
/// one package is installed.
pub fn parse_appx_listing(text: &str) -> Vec<PackageRecord> {
    let Ok(value) = serde_json::from_str::<Value>(text.trim()) else {
        return Vec::new();
    };
    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![&value],
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| {
            let name = item.get("Name").and_then(Value::as_str).unwrap_or("");
            let version = match item.get("Version") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(
                PackageRecord::new(format!("store:{}", name), name, Source::Store)
                    .with_installed(version),
            )
        })
        .collect()
}

/// Store apps reported by `Get-AppxPackage`.
pub struct StoreSource {
    runner: Arc<dyn CommandRunner>,
}

impl StoreSource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SourceAdapter for StoreSource {
    fn source(&self) -> Source {
        Source::Store
    }

    fn name(&self) -> &str {
        "msstore"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Baselines
    }

    fn scan(&self, budget: Duration) -> AdapterScan {
        let argv = [
            POWERSHELL,
            "-NoLogo",
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            QUERY,
        ];
        let out = self.runner.run_captured_with_timeout(&argv, budget);
        if !out.success() || out.text.trim().is_empty() {
            tracing::warn!(
                exit_code = out.exit_code,
                timed_out = out.timed_out,
                "Store enumeration failed"
            );
            return AdapterScan::failed();
        }

        AdapterScan::ok(parse_appx_listing(&out.text))
    }
}
