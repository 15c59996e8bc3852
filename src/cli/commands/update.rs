//! Update command implementation.
//!
//! The `upkeep update` command applies updates and prints where each
//! identifier ended up.

use std::io::Write;
use std::sync::Arc;

use crate::cli::args::UpdateArgs;
use crate::error::Result;
use crate::shell::CommandRunner;
use crate::ui::{outcome_table, should_use_colors, ProgressSpinner};
use crate::update::{UpdateExecutor, UpdateRun};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// Exit code when at least one identifier failed.
pub const PARTIAL_FAILURE_EXIT_CODE: i32 = 1;

/// The update command implementation.
pub struct UpdateCommand {
    args: UpdateArgs,
}

impl UpdateCommand {
    pub fn new(args: UpdateArgs) -> Self {
        Self { args }
    }

    /// Apply updates through `runner` and write the summary.
    pub fn run_with(
        &self,
        ctx: &CommandContext,
        runner: Arc<dyn CommandRunner>,
        out: &mut dyn Write,
    ) -> Result<CommandResult> {
        let executor = UpdateExecutor::new(runner)
            .with_cache(ctx.cache())
            .with_lookup_timeout(ctx.settings.scan_budget());
        let run = executor.run(&self.args.ids);

        if let Some(path) = &self.args.report {
            run.save(path, self.args.format)?;
        }
        write_summary(ctx, out, &run)?;

        Ok(if run.outcomes.all_ok() {
            CommandResult::success()
        } else {
            CommandResult::failure(PARTIAL_FAILURE_EXIT_CODE)
        })
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ctx: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        let spinner = if should_use_colors() {
            ProgressSpinner::new("Updating packages...")
        } else {
            ProgressSpinner::hidden()
        };
        let runner = ctx.runner(Some(spinner.output_callback("Updating packages...", 3)));
        let result = self.run_with(ctx, runner, out);
        spinner.clear();
        result
    }
}

fn write_summary(ctx: &CommandContext, out: &mut dyn Write, run: &UpdateRun) -> Result<()> {
    let theme = &ctx.theme;
    let outcomes = &run.outcomes;

    writeln!(out, "{}", outcome_table(outcomes).render())?;
    writeln!(
        out,
        "{}",
        theme.format_header(&format!(
            "{} of {} package(s) updated",
            outcomes.succeeded(),
            outcomes.len()
        ))
    )?;

    if !outcomes.failed.is_empty() {
        writeln!(
            out,
            "{}",
            theme.format_error(&format!("Failed: {}", outcomes.failed.join(", ")))
        )?;
    }
    if !outcomes.store_skipped.is_empty() {
        writeln!(
            out,
            "{}",
            theme.format_skipped("Store apps cannot be updated from an elevated prompt")
        )?;
    }
    if run.reboot_required {
        writeln!(out, "{}", theme.format_warning("A reboot is required to finish"))?;
    }
    for note in &run.notes {
        writeln!(out, "{}", theme.dim.apply_to(note))?;
    }
    if ctx.dry_run {
        writeln!(out, "{}", theme.format_skipped("Dry run: no commands were executed"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::shell::ScriptedRunner;
    use crate::ui::Theme;
    use crate::update::ReportFormat;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        CommandContext::new(Settings::default(), temp.path().to_path_buf())
            .with_theme(Theme::plain())
    }

    fn args(ids: &[&str]) -> UpdateArgs {
        UpdateArgs {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            report: None,
            format: ReportFormat::Json,
        }
    }

    #[test]
    fn failures_set_exit_code() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let runner = Arc::new(
            ScriptedRunner::new()
                .with_programs(&["winget"])
                .on(&["winget", "upgrade", "--id", "Vendor.App"], 0, ""),
        );

        let mut out = Vec::new();
        let result = UpdateCommand::new(args(&["Vendor.App", "Broken.App", "bad id"]))
            .run_with(&ctx, runner, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(result.exit_code, PARTIAL_FAILURE_EXIT_CODE);
        assert!(text.contains("1 of 3 package(s) updated"));
        assert!(text.contains("Failed: Broken.App"));
    }

    #[test]
    fn writes_requested_report() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let runner = Arc::new(
            ScriptedRunner::new()
                .with_programs(&["winget"])
                .on(&["winget", "upgrade", "--id", "Vendor.App"], 0, ""),
        );

        let report = temp.path().join("out").join("report.txt");
        let mut update_args = args(&["Vendor.App"]);
        update_args.report = Some(report.clone());
        update_args.format = ReportFormat::Text;

        let mut out = Vec::new();
        let result = UpdateCommand::new(update_args)
            .run_with(&ctx, runner, &mut out)
            .unwrap();

        assert!(result.success);
        let saved = std::fs::read_to_string(report).unwrap();
        assert!(saved.contains("Updated\n  - Vendor.App"));
    }
}
