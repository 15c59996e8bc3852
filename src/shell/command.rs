//! External command execution.
//!
//! Every interaction with package managers goes through [`CommandRunner`].
//! Adapters and the update chain never touch `std::process` directly, which
//! keeps them testable with [`ScriptedRunner`](super::mock::ScriptedRunner).

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::platform::tool_available;

/// Exit code reported when a command was killed after its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when a command could not be started.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 1;

/// How long to wait for output readers after a timed-out child is killed.
const READER_GRACE: Duration = Duration::from_millis(200);

/// Captured result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    /// Process exit code (spawn failures and signals map to non-zero codes).
    pub exit_code: i32,

    /// Captured standard output.
    pub text: String,

    /// The command was killed because it ran past its timeout.
    pub timed_out: bool,
}

impl Captured {
    /// A completed run.
    pub fn new(exit_code: i32, text: impl Into<String>) -> Self {
        Self {
            exit_code,
            text: text.into(),
            timed_out: false,
        }
    }

    /// A run that was killed after its timeout.
    pub fn timed_out(text: impl Into<String>) -> Self {
        Self {
            exit_code: TIMEOUT_EXIT_CODE,
            text: text.into(),
            timed_out: true,
        }
    }

    /// A command that never started.
    pub fn spawn_failure() -> Self {
        Self::new(SPAWN_FAILURE_EXIT_CODE, "")
    }

    /// Exit code 0 and not timed out.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Output line from a streamed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streamed output.
pub type OutputCallback = Arc<dyn Fn(OutputLine) + Send + Sync>;

/// Runs external programs.
///
/// Implementations never fail: a program that cannot be started reports a
/// non-zero exit code with empty text.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, capturing standard output.
    fn run_captured(&self, argv: &[&str]) -> Captured;

    /// Run with a wall-clock limit; the child is killed when it is exceeded.
    fn run_captured_with_timeout(&self, argv: &[&str], timeout: Duration) -> Captured;

    /// Run with output forwarded live, returning the exit code.
    fn run_streamed(&self, argv: &[&str]) -> i32;

    /// Whether `program` can be found.
    fn is_available(&self, program: &str) -> bool;
}

/// [`CommandRunner`] backed by real processes.
#[derive(Clone, Default)]
pub struct SystemRunner {
    dry_run: bool,
    on_line: Option<OutputCallback>,
}

impl std::fmt::Debug for SystemRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRunner")
            .field("dry_run", &self.dry_run)
            .field("on_line", &self.on_line.is_some())
            .finish()
    }
}

impl SystemRunner {
    /// Create a runner that executes commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log commands instead of running them; every run reports success.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Forward streamed output to `callback` instead of stdout.
    pub fn with_output(mut self, callback: OutputCallback) -> Self {
        self.on_line = Some(callback);
        self
    }

    /// Whether this runner is in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn command(argv: &[&str]) -> Option<Command> {
        let (program, args) = argv.split_first()?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        Some(cmd)
    }

    fn spawn_piped(argv: &[&str]) -> Option<Child> {
        let mut cmd = Self::command(argv)?;
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        match cmd.spawn() {
            Ok(child) => Some(child),
            Err(e) => {
                tracing::debug!(command = %argv.join(" "), error = %e, "Failed to start command");
                None
            }
        }
    }

    fn emit(&self, line: OutputLine) {
        match &self.on_line {
            Some(callback) => callback(line),
            None => match line {
                OutputLine::Stdout(s) => println!("{}", s),
                OutputLine::Stderr(s) => eprintln!("{}", s),
            },
        }
    }
}

/// Read a pipe to the end on a background thread.
fn spawn_reader(stream: Option<impl Read + Send + 'static>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Poll `child` until it exits or `timeout` elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE)
}

impl CommandRunner for SystemRunner {
    fn run_captured(&self, argv: &[&str]) -> Captured {
        tracing::debug!(command = %argv.join(" "), "run");
        if self.dry_run {
            tracing::info!("[dry-run] {}", argv.join(" "));
            return Captured::new(0, "");
        }

        let Some(mut cmd) = Self::command(argv) else {
            return Captured::spawn_failure();
        };
        match cmd.output() {
            Ok(output) => Captured::new(
                exit_code(output.status),
                String::from_utf8_lossy(&output.stdout),
            ),
            Err(e) => {
                tracing::debug!(command = %argv.join(" "), error = %e, "Failed to start command");
                Captured::spawn_failure()
            }
        }
    }

    fn run_captured_with_timeout(&self, argv: &[&str], timeout: Duration) -> Captured {
        tracing::debug!(command = %argv.join(" "), timeout_secs = timeout.as_secs(), "run");
        if self.dry_run {
            tracing::info!("[dry-run] {}", argv.join(" "));
            return Captured::new(0, "");
        }

        let Some(mut child) = Self::spawn_piped(argv) else {
            return Captured::spawn_failure();
        };
        let stdout = spawn_reader(child.stdout.take());
        // Drain stderr so a chatty child never blocks on a full pipe.
        let _stderr = spawn_reader(child.stderr.take());

        match wait_with_timeout(&mut child, timeout) {
            Ok(Some(status)) => {
                let text = stdout.recv().unwrap_or_default();
                Captured::new(exit_code(status), text)
            }
            Ok(None) => {
                tracing::debug!(command = %argv.join(" "), "Command timed out, killing process");
                let _ = child.kill();
                let _ = child.wait();
                let text = stdout.recv_timeout(READER_GRACE).unwrap_or_default();
                Captured::timed_out(text)
            }
            Err(e) => {
                tracing::debug!(command = %argv.join(" "), error = %e, "Failed to wait on command");
                let _ = child.kill();
                let _ = child.wait();
                Captured::spawn_failure()
            }
        }
    }

    fn run_streamed(&self, argv: &[&str]) -> i32 {
        tracing::debug!(command = %argv.join(" "), "run (streamed)");
        if self.dry_run {
            tracing::info!("[dry-run] {}", argv.join(" "));
            return 0;
        }

        let Some(mut child) = Self::spawn_piped(argv) else {
            return SPAWN_FAILURE_EXIT_CODE;
        };
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel();
        let tx_stderr = tx.clone();

        let stdout_handle = thread::spawn(move || {
            if let Some(stdout) = stdout {
                for line in BufReader::new(stdout).lines().map_while(std::result::Result::ok) {
                    let _ = tx.send(OutputLine::Stdout(line));
                }
            }
        });
        let stderr_handle = thread::spawn(move || {
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                    let _ = tx_stderr.send(OutputLine::Stderr(line));
                }
            }
        });

        for line in rx {
            let blank = match &line {
                OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.trim().is_empty(),
            };
            if !blank {
                self.emit(line);
            }
        }

        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        match child.wait() {
            Ok(status) => exit_code(status),
            Err(_) => SPAWN_FAILURE_EXIT_CODE,
        }
    }

    fn is_available(&self, program: &str) -> bool {
        tool_available(program)
    }
}
