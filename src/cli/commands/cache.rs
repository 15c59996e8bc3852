//! Cache command implementation.
//!
//! Provides `upkeep cache show` and `upkeep cache clear`.

use std::io::Write;
use std::time::Duration;

use serde_json::json;

use crate::cache::format_duration;
use crate::cli::args::{CacheArgs, CacheSubcommand};
use crate::error::Result;
use crate::ui::package_table;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The cache command implementation.
pub struct CacheCommand {
    args: CacheArgs,
}

impl CacheCommand {
    pub fn new(args: CacheArgs) -> Self {
        Self { args }
    }
}

impl Command for CacheCommand {
    fn execute(&self, ctx: &CommandContext, out: &mut dyn Write) -> Result<CommandResult> {
        match &self.args.command {
            CacheSubcommand::Show { json } => show_cache(ctx, *json, out)?,
            CacheSubcommand::Clear => clear_cache(ctx, out)?,
        }
        Ok(CommandResult::success())
    }
}

fn show_cache(ctx: &CommandContext, json: bool, out: &mut dyn Write) -> Result<()> {
    let cache = ctx.cache();
    let theme = &ctx.theme;
    let entry = cache.load()?;

    if json {
        let value = match &entry {
            Some(entry) => json!({
                "path": cache.path(),
                "cached_at": entry.cached_at(),
                "fresh": entry.is_fresh(cache.ttl()),
                "rows": entry.rows,
            }),
            None => json!({ "path": cache.path(), "rows": [] }),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&value).map_err(anyhow::Error::from)?)?;
        return Ok(());
    }

    let Some(entry) = entry else {
        writeln!(out, "Cache is empty")?;
        writeln!(out, "{}", theme.format_pair("Location", &cache.path().display().to_string()))?;
        return Ok(());
    };

    let age = format_duration(Duration::try_from_secs_f64(entry.age_secs()).unwrap_or_default());
    let status = if entry.is_fresh(cache.ttl()) {
        format!("fresh (ttl {})", format_duration(cache.ttl()))
    } else {
        "stale".to_string()
    };

    writeln!(out, "{}", theme.format_pair("Location", &cache.path().display().to_string()))?;
    writeln!(out, "{}", theme.format_pair("Age", &age))?;
    writeln!(out, "{}", theme.format_pair("Status", &status))?;
    writeln!(out, "{}", theme.format_pair("Rows", &entry.rows.len().to_string()))?;
    if !entry.rows.is_empty() {
        writeln!(out, "{}", package_table(&entry.rows).render())?;
    }
    Ok(())
}

fn clear_cache(ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
    let cache = ctx.cache();
    if cache.clear()? {
        writeln!(out, "{}", ctx.theme.format_success("Cleared the scan cache"))?;
    } else {
        writeln!(out, "Cache is already empty")?;
    }
    Ok(())
}
