//! Silent-install capability checks.
//!
//! A winget package is only offered for unattended update when one of its
//! installers can run without a wizard.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::shell::CommandRunner;
use crate::sources::winget::{AGREEMENT_FLAGS, WINGET};

/// Installer types that never show a wizard.
const SELF_CONTAINED_TYPES: [&str; 2] = ["msix", "appx"];

/// Limit on one `winget show` unless the caller passes its own.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Memoized per-package silent-install check.
///
/// Shared between scan workers; answers (including failures and
/// timeouts) are cached for the prober's lifetime.
pub struct SilentInstallProber {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    memo: Mutex<HashMap<String, bool>>,
}

impl SilentInstallProber {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: DEFAULT_CHECK_TIMEOUT,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Limit each `winget show` to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `id` has an installer that can run unattended.
    pub fn supports_silent(&self, id: &str) -> bool {
        self.supports_silent_within(id, self.timeout)
    }

    /// Like [`supports_silent`](Self::supports_silent) with an explicit
    /// limit. A zero limit answers `false` from outside the memo without
    /// running anything.
    pub fn supports_silent_within(&self, id: &str, timeout: Duration) -> bool {
        if let Some(answer) = self.memo.lock().ok().and_then(|m| m.get(id).copied()) {
            return answer;
        }
        if timeout.is_zero() {
            tracing::debug!(id, "No time left to check silent install support");
            return false;
        }

        let answer = self.query(id, timeout);
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(id.to_string(), answer);
        }
        answer
    }

    fn query(&self, id: &str, timeout: Duration) -> bool {
        let mut argv = vec![WINGET, "show", "--id", id, "--source", WINGET];
        argv.extend(AGREEMENT_FLAGS);
        argv.extend(["--disable-interactivity", "--output", "json"]);

        let out = self.runner.run_captured_with_timeout(&argv, timeout);
        if out.timed_out {
            tracing::warn!(id, "winget show timed out after {:?}", timeout);
            return false;
        }
        if !out.success() {
            tracing::debug!(id, exit_code = out.exit_code, "winget show failed");
            return false;
        }
        match serde_json::from_str::<Value>(out.text.trim()) {
            Ok(manifest) => manifest_supports_silent(&manifest),
            Err(_) => false,
        }
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}

/// Whether a `winget show` manifest declares a silent-capable installer.
///
/// Accepts a single manifest or a list of them, with installers under
/// `Installers` or `InstallersList`.
pub fn manifest_supports_silent(manifest: &Value) -> bool {
    let manifests: Vec<&Value> = match manifest {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![manifest],
        _ => return false,
    };

    manifests
        .iter()
        .filter_map(|m| {
            m.get("Installers")
                .filter(|v| truthy(Some(*v)))
                .or_else(|| m.get("InstallersList"))
                .and_then(Value::as_array)
        })
        .flatten()
        .any(|installer| {
            let switches = installer.get("InstallerSwitches");
            let silent = switches.is_some_and(|s| {
                truthy(s.get("Silent")) || truthy(s.get("SilentWithProgress"))
            });
            let kind = installer
                .get("InstallerType")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_lowercase();
            silent || SELF_CONTAINED_TYPES.contains(&kind.as_str())
        })
}
