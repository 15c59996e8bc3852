//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::scan::ProgressFn;
use crate::shell::{OutputCallback, OutputLine};

use super::theme::Theme;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Longest live output line shown under a spinner.
const MAX_LIVE_WIDTH: usize = 72;

/// A spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: Theme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars(TICK_CHARS)
            .template("{spinner:.magenta} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            theme: Theme::detect(),
        }
    }

    /// A spinner that draws nothing (for `--json` and non-terminals).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: Theme::plain(),
        }
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Current message, including any live output lines.
    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Scan progress callback that drives this spinner.
    pub fn progress_callback(&self) -> ProgressFn {
        let bar = self.bar.clone();
        Arc::new(move |percent: u8, stage: &str, detail: &str| {
            let msg = if detail.is_empty() {
                format!("[{:>3}%] {}", percent, stage)
            } else {
                format!("[{:>3}%] {}: {}", percent, stage, detail)
            };
            bar.set_message(msg);
        })
    }

    /// Command output callback that shows the last few lines under `base`.
    pub fn output_callback(&self, base: &str, max_lines: usize) -> OutputCallback {
        live_output_callback(self.bar.clone(), base.to_string(), 2, max_lines)
    }

    fn finish_with(&self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }

    pub fn finish_success(&self, msg: &str) {
        self.finish_with(self.theme.format_success(msg));
    }

    pub fn finish_warning(&self, msg: &str) {
        self.finish_with(self.theme.format_warning(msg));
    }

    pub fn finish_error(&self, msg: &str) {
        self.finish_with(self.theme.format_error(msg));
    }

    /// Remove the spinner without leaving a line behind.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Create an output callback that keeps the last `max_lines` lines of
/// command output under the spinner's base message.
pub fn live_output_callback(
    bar: ProgressBar,
    base_message: String,
    indent: usize,
    max_lines: usize,
) -> OutputCallback {
    let buffer: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
    let theme = Theme::detect();

    Arc::new(move |line: OutputLine| {
        let text = match &line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.trim_end(),
        };
        if text.is_empty() {
            return;
        }

        let display = if text.chars().count() > MAX_LIVE_WIDTH {
            let head: String = text.chars().take(MAX_LIVE_WIDTH - 3).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        };

        let Ok(mut buf) = buffer.lock() else {
            return;
        };
        buf.push_back(display);
        while buf.len() > max_lines {
            buf.pop_front();
        }

        let prefix = " ".repeat(indent);
        let mut msg = base_message.clone();
        for line in buf.iter() {
            msg.push('\n');
            msg.push_str(&prefix);
            msg.push_str(&theme.dim.apply_to(format!("» {}", line)).to_string());
        }

        bar.set_message(msg);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_callback_formats_stage_and_detail() {
        let spinner = ProgressSpinner::hidden();
        let progress = spinner.progress_callback();

        progress(30, "Scanning sources", "");
        assert_eq!(spinner.message(), "[ 30%] Scanning sources");

        progress(85, "Checking vendor pages", "Vendor App");
        assert_eq!(spinner.message(), "[ 85%] Checking vendor pages: Vendor App");
        spinner.finish_success("Done");
    }

    #[test]
    fn live_output_keeps_last_lines() {
        let bar = ProgressBar::hidden();
        let callback = live_output_callback(bar.clone(), "Updating...".to_string(), 2, 2);

        callback(OutputLine::Stdout("line 1".to_string()));
        callback(OutputLine::Stderr("line 2".to_string()));
        callback(OutputLine::Stdout("line 3".to_string()));

        let msg = bar.message();
        assert!(msg.starts_with("Updating..."));
        assert!(!msg.contains("line 1"));
        assert!(msg.contains("line 2"));
        assert!(msg.contains("line 3"));
        bar.finish();
    }

    #[test]
    fn live_output_skips_blank_and_truncates_long_lines() {
        let bar = ProgressBar::hidden();
        let callback = live_output_callback(bar.clone(), "Updating...".to_string(), 2, 2);

        callback(OutputLine::Stdout("   ".to_string()));
        assert_eq!(bar.message(), "Updating...");

        callback(OutputLine::Stdout("é".repeat(100)));
        let msg = bar.message();
        assert!(msg.contains("..."));
        assert!(!msg.contains(&"é".repeat(100)));
        assert_eq!(msg.matches('\n').count(), 1);
        bar.finish();
    }
}
