//! Installed-software baselines from the Windows uninstall registry.
//!
//! Read through `reg query`, so the source works through the same
//! [`CommandRunner`] as every other tool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{AdapterScan, SourceAdapter, SourceRole};
use crate::package::{hash_name, PackageRecord, Source};
use crate::shell::CommandRunner;

/// Uninstall keys, per machine, per user and 32-bit on 64-bit.
pub const UNINSTALL_KEYS: [&str; 3] = [
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];

/// One uninstall entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key: String,
    pub display_name: String,
    pub display_version: String,
    pub publisher: String,
    pub install_location: String,
}

impl RegistryEntry {
    /// Baseline record, if the entry has both a name and a version.
    /// Publisher and install location travel with it as its origin.
    pub fn to_record(&self) -> Option<PackageRecord> {
        if self.display_name.is_empty() || self.display_version.is_empty() {
            return None;
        }
        Some(
            PackageRecord::new(
                format!("reg:{}", hash_name(&self.display_name)),
                self.display_name.clone(),
                Source::Registry,
            )
            .with_installed(self.display_version.clone())
            .with_origin(self.publisher.clone(), self.install_location.clone()),
        )
    }
}

/// Parse `reg query <key> /s` output into entries.
///
/// Every `HKEY_` line starts a new entry; indented lines are
/// `name    type    value` triples separated by four spaces.
pub fn parse_reg_query(text: &str) -> Vec<RegistryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RegistryEntry> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("HKEY_") {
            entries.extend(current.take());
            current = Some(RegistryEntry {
                key: trimmed.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        let mut fields = trimmed.splitn(3, "    ").map(str::trim);
        let (Some(name), Some(_kind)) = (fields.next(), fields.next()) else {
            continue;
        };
        let value = fields.next().unwrap_or("").to_string();
        match name {
            "DisplayName" => entry.display_name = value,
            "DisplayVersion" => entry.display_version = value,
            "Publisher" => entry.publisher = value,
            "InstallLocation" => entry.install_location = value,
            _ => {}
        }
    }
    entries.extend(current);
    entries
}

/// Installed programs listed under the uninstall keys.
pub struct RegistrySource {
    runner: Arc<dyn CommandRunner>,
}

impl RegistrySource {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SourceAdapter for RegistrySource {
    fn source(&self) -> Source {
        Source::Registry
    }

    fn name(&self) -> &str {
        "registry"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Baselines
    }

    fn scan(&self, budget: Duration) -> AdapterScan {
        let deadline = Instant::now() + budget;
        let mut records = Vec::new();
        let mut answered = false;

        for key in UNINSTALL_KEYS {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("Registry scan ran out of time");
                break;
            }
            let out = self
                .runner
                .run_captured_with_timeout(&["reg", "query", key, "/s"], remaining);
            if !out.success() {
                tracing::debug!(key, exit_code = out.exit_code, "Registry key unreadable");
                continue;
            }
            answered = true;
            records.extend(
                parse_reg_query(&out.text)
                    .iter()
                    .filter_map(RegistryEntry::to_record),
            );
        }

        if answered {
            AdapterScan::ok(records)
        } else {
            AdapterScan::failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ScriptedRunner;

    const OUTPUT: &str = r"
HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\7-Zip
    DisplayName    REG_SZ    7-Zip 23.01 (x64)
    DisplayVersion    REG_SZ    23.01
    Publisher    REG_SZ    Igor Pavlov
    InstallLocation    REG_SZ    C:\Program Files\7-Zip\

HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\NoVersion
    DisplayName    REG_SZ    Orphan Tool

HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\Editor
    DisplayName    REG_SZ    Some Editor
    DisplayVersion    REG_SZ    4.2.0
";

    #[test]
    fn parses_entries_and_values() {
        let entries = parse_reg_query(OUTPUT);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].display_name, "7-Zip 23.01 (x64)");
        assert_eq!(entries[0].publisher, "Igor Pavlov");
        assert_eq!(entries[0].install_location, r"C:\Program Files\7-Zip\");
        assert!(entries[1].display_version.is_empty());
    }

    #[test]
    fn records_need_name_and_version() {
        let records: Vec<PackageRecord> = parse_reg_query(OUTPUT)
            .iter()
            .filter_map(RegistryEntry::to_record)
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Some Editor");
        assert_eq!(records[1].installed_version, "4.2.0");
        assert!(records[1].available_version.is_empty());
        assert_eq!(records[1].id, format!("reg:{}", hash_name("Some Editor")));
        assert_eq!(records[1].source, Source::Registry);
        assert!(records[1].origin.is_none());

        let origin = records[0].origin.as_ref().unwrap();
        assert_eq!(origin.publisher, "Igor Pavlov");
        assert_eq!(origin.location, r"C:\Program Files\7-Zip\");
    }

    #[test]
    fn scan_queries_every_key() {
        let runner = Arc::new(ScriptedRunner::new().on(&["reg", "query"], 0, OUTPUT).on(
            &["reg", "query", UNINSTALL_KEYS[2]],
            1,
            "ERROR: The system was unable to find the specified registry key or value.",
        ));
        let source = RegistrySource::new(runner.clone());
        let scan = source.scan(Duration::from_secs(10));

        assert!(scan.ok);
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(scan.records.len(), 4);
        assert_eq!(source.role(), SourceRole::Baselines);
    }

    #[test]
    fn unreadable_registry_fails_soft() {
        let runner = Arc::new(ScriptedRunner::new());
        let scan = RegistrySource::new(runner).scan(Duration::from_secs(10));
        assert!(!scan.ok);
        assert!(scan.records.is_empty());
    }
}
