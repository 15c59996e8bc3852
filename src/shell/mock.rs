//! Scripted command runner for testing.
//!
//! `ScriptedRunner` implements [`CommandRunner`] without spawning anything.
//! Responses are registered against argument patterns and every invocation
//! is recorded for later assertion.
//!
//! # Example
//!
//! ```
//! use upkeep::shell::{CommandRunner, ScriptedRunner};
//!
//! let runner = ScriptedRunner::new()
//!     .with_programs(&["choco"])
//!     .on(&["choco", "outdated"], 0, "git.install|2.40.0|2.44.0|false\n");
//!
//! let out = runner.run_captured(&["choco", "outdated", "-r"]);
//! assert_eq!(out.exit_code, 0);
//! assert_eq!(runner.calls().len(), 1);
//! ```

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use super::command::{Captured, CommandRunner, SPAWN_FAILURE_EXIT_CODE};

#[derive(Debug, Clone)]
struct Script {
    pattern: Vec<String>,
    response: Captured,
}

/// Test double for [`CommandRunner`].
///
/// A pattern matches an invocation when its tokens appear in the argument
/// list in the same order, not necessarily adjacent. When several patterns
/// match, the one with the most tokens wins; ties go to the latest
/// registration. Unmatched invocations report exit code 1 with no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Vec<Script>,
    available: HashSet<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create a runner with no programs and no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark programs as installed.
    pub fn with_programs(mut self, programs: &[&str]) -> Self {
        self.available
            .extend(programs.iter().map(|p| p.to_string()));
        self
    }

    /// Respond to invocations matching `pattern`.
    pub fn on(mut self, pattern: &[&str], exit_code: i32, text: &str) -> Self {
        self.scripts.push(Script {
            pattern: pattern.iter().map(|s| s.to_string()).collect(),
            response: Captured::new(exit_code, text),
        });
        self
    }

    /// Make invocations matching `pattern` time out.
    pub fn on_timeout(mut self, pattern: &[&str]) -> Self {
        self.scripts.push(Script {
            pattern: pattern.iter().map(|s| s.to_string()).collect(),
            response: Captured::timed_out(""),
        });
        self
    }

    /// Every recorded invocation, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded invocations joined with spaces.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().into_iter().map(|argv| argv.join(" ")).collect()
    }

    /// Number of invocations matching `pattern`.
    pub fn count_matching(&self, pattern: &[&str]) -> usize {
        let pattern: Vec<String> = pattern.iter().map(|s| s.to_string()).collect();
        self.calls()
            .iter()
            .filter(|argv| is_subsequence(&pattern, argv))
            .count()
    }

    fn record(&self, argv: &[&str]) -> Vec<String> {
        let owned: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(owned.clone());
        }
        owned
    }

    fn respond(&self, argv: &[&str]) -> Captured {
        let argv = self.record(argv);
        self.scripts
            .iter()
            .enumerate()
            .filter(|(_, s)| is_subsequence(&s.pattern, &argv))
            .max_by_key(|(i, s)| (s.pattern.len(), *i))
            .map(|(_, s)| s.response.clone())
            .unwrap_or_else(|| Captured::new(SPAWN_FAILURE_EXIT_CODE, ""))
    }
}

fn is_subsequence(pattern: &[String], argv: &[String]) -> bool {
    let mut rest = argv.iter();
    pattern.iter().all(|p| rest.any(|a| a == p))
}

impl CommandRunner for ScriptedRunner {
    fn run_captured(&self, argv: &[&str]) -> Captured {
        self.respond(argv)
    }

    fn run_captured_with_timeout(&self, argv: &[&str], _timeout: Duration) -> Captured {
        self.respond(argv)
    }

    fn run_streamed(&self, argv: &[&str]) -> i32 {
        self.respond(argv).exit_code
    }

    fn is_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }
}
