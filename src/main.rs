//! upkeep CLI entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upkeep::cli::{Cli, CommandContext, CommandDispatcher};
use upkeep::ui::Theme;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("upkeep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upkeep=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("upkeep starting with args: {:?}", cli);

    let result = CommandContext::from_cli(&cli).and_then(|ctx| {
        let dispatcher = CommandDispatcher::new(ctx);
        let mut stdout = io::stdout().lock();
        let result = dispatcher.dispatch(&cli.command, &mut stdout);
        let _ = stdout.flush();
        result
    });

    match result {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("{}", Theme::detect().format_error(&format!("Error: {}", e)));
            ExitCode::from(2)
        }
    }
}
