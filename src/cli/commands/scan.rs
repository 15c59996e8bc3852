//! Scan command implementation.
//!
//! The `upkeep scan` command lists upgradable packages.

use std::io::Write;
use std::sync::Arc;

use crate::cli::args::ScanArgs;
use crate::error::Result;
use crate::package::PackageRecord;
use crate::scan::{ScanReport, Scanner};
use crate::sources::default_adapters;
use crate::sources::web::{HttpFetcher, WebRules};
use crate::ui::{package_table, should_use_colors, source_table, ProgressSpinner};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The scan command implementation.
pub struct ScanCommand {
    args: ScanArgs,
}

impl ScanCommand {
    pub fn new(args: ScanArgs) -> Self {
        Self { args }
    }

    /// Build the scanner described by the context's settings.
    pub fn scanner(&self, ctx: &CommandContext) -> Scanner {
        let runner = ctx.runner(None);
        let settings = &ctx.settings;
        let mut scanner = Scanner::new(Arc::clone(&runner), ctx.cache())
            .with_adapters(default_adapters(&settings.sources, runner))
            .with_budget(settings.scan_budget());

        if settings.sources.web {
            let rules = WebRules::load_or_empty(&ctx.rules_path());
            if !rules.is_empty() {
                scanner = scanner.with_web_rules(rules, Arc::new(HttpFetcher::new()));
            }
        }
        scanner
    }
}

impl Command for ScanCommand {
    fn execute(&self, ctx: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        let force = self.args.refresh || ctx.settings.force_refresh;
        let skip_store = ctx.settings.skip_store_scan && !self.args.include_store;

        let spinner = if self.args.json || !should_use_colors() {
            ProgressSpinner::hidden()
        } else {
            ProgressSpinner::new("Scanning for updates...")
        };
        let scanner = self.scanner(ctx).with_progress(spinner.progress_callback());
        let (rows, report) = scanner.scan_with_report(force, skip_store);
        spinner.clear();

        if self.args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&rows).map_err(anyhow::Error::from)?)?;
        } else {
            write_summary(ctx, out, &rows, &report)?;
        }

        Ok(CommandResult::success())
    }
}

fn write_summary(
    ctx: &CommandContext,
    out: &mut dyn Write,
    rows: &[PackageRecord],
    report: &ScanReport,
) -> Result<()> {
    let theme = &ctx.theme;

    if !report.from_cache && !report.adapters.is_empty() {
        writeln!(out, "{}", source_table(report).render())?;
    }

    if rows.is_empty() {
        writeln!(out, "{}", theme.format_success("Everything is up to date"))?;
        return Ok(());
    }

    writeln!(out, "{}", package_table(rows).render())?;
    let mut summary = format!("{} update(s) available", rows.len());
    if report.from_cache {
        summary.push_str(" (cached, use --refresh to rescan)");
    }
    writeln!(out, "{}", theme.format_header(&summary))?;

    for adapter in report.degraded() {
        writeln!(
            out,
            "{}",
            theme.format_warning(&format!("{} {}", adapter.name, adapter.status))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ScanCache;
    use crate::config::Settings;
    use crate::package::Source;
    use crate::ui::Theme;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        CommandContext::new(Settings::default(), temp.path().to_path_buf())
            .with_theme(Theme::plain())
    }

    fn seed_cache(cache: &ScanCache) {
        cache
            .write(&[PackageRecord::new("Vendor.App", "Vendor App", Source::PrimaryPm)
                .with_installed("1.0.0")
                .with_available("1.1.0")])
            .unwrap();
    }

    #[test]
    fn fresh_cache_is_printed_as_table() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        seed_cache(&ctx.cache());

        let mut out = Vec::new();
        let result = ScanCommand::new(ScanArgs::default()).execute(&ctx, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(result.success);
        assert!(text.contains("Vendor.App"));
        assert!(text.contains("1 update(s) available (cached"));
    }

    #[test]
    fn json_output_uses_record_field_names() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        seed_cache(&ctx.cache());

        let mut out = Vec::new();
        let args = ScanArgs {
            json: true,
            ..Default::default()
        };
        ScanCommand::new(args).execute(&ctx, &mut out).unwrap();

        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows[0]["Id"], "Vendor.App");
        assert_eq!(rows[0]["Source"], "winget");
    }

    #[test]
    fn empty_scan_reports_up_to_date() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.sources.winget = false;
        settings.sources.choco = false;
        settings.sources.scoop = false;
        settings.sources.registry = false;
        settings.sources.store = false;
        settings.sources.web = false;
        let ctx = CommandContext::new(settings, temp.path().to_path_buf()).with_theme(Theme::plain());

        let mut out = Vec::new();
        let args = ScanArgs {
            refresh: true,
            ..Default::default()
        };
        ScanCommand::new(args).execute(&ctx, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Everything is up to date"));
    }
}
