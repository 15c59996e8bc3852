//! Platform checks: tool lookup and elevation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::command::CommandRunner;

/// Limit on the Windows elevation check.
const ELEVATION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Check if running as root/admin.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        // Never dry-run: the answer decides which updates are attempted.
        elevated_by_net_session(&super::command::SystemRunner::new())
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// `net session` only succeeds from an elevated token.
#[cfg_attr(not(windows), allow(dead_code))]
fn elevated_by_net_session(runner: &dyn CommandRunner) -> bool {
    runner
        .run_captured_with_timeout(&["net", "session"], ELEVATION_CHECK_TIMEOUT)
        .success()
}

/// Parse the system PATH into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Check whether a file has any executable bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// File names a program may be installed under.
///
/// On Windows every `PATHEXT` extension is tried (`winget` → `winget.exe`,
/// `scoop` → `scoop.cmd`), unless the name already carries one.
fn candidate_names(tool: &str) -> Vec<String> {
    if cfg!(windows) && Path::new(tool).extension().is_none() {
        let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".into());
        let mut names: Vec<String> = pathext
            .split(';')
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!("{}{}", tool, ext.to_lowercase()))
            .collect();
        names.push(tool.to_string());
        names
    } else {
        vec![tool.to_string()]
    }
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    let names = candidate_names(tool);
    for dir in path_entries {
        for name in &names {
            let candidate = dir.join(name);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Whether `tool` can be found on the system PATH.
pub fn tool_available(tool: &str) -> bool {
    let path = Path::new(tool);
    if path.components().count() > 1 {
        return path.is_file() && is_executable(path);
    }
    resolve_tool_path(tool, &parse_system_path()).is_some()
}
