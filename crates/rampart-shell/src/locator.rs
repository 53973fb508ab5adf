//! Shell interpreter discovery.
//!
//! Probes for a usable PowerShell interpreter, preferring the modern
//! cross-platform `pwsh` on PATH and falling back, on Windows only, to
//! the well-known install locations of the legacy Desktop-edition
//! `powershell.exe`. The first probe that runs and produces parseable
//! version output wins. Results are cached per locator instance.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use rampart_types::{InterpreterInfo, Platform, RampartError};

use crate::process::{run_with_deadline, WaitOutcome};

/// Hard ceiling on a version probe; a hung interpreter is a failed probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Well-known legacy interpreter locations, checked only on Windows.
const LEGACY_WINDOWS_PATHS: &[&str] = &[
    r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe",
    r"C:\Windows\SysWOW64\WindowsPowerShell\v1.0\powershell.exe",
];

/// Discovers and caches interpreter metadata.
///
/// The cache is write-once-then-read-many, guarded by a mutex so
/// concurrent callers share one probe. Owned by the instance rather than
/// a global so differently-configured locators can coexist in tests.
pub struct InterpreterLocator {
    cache: Mutex<Option<InterpreterInfo>>,
    override_path: Option<PathBuf>,
}

impl InterpreterLocator {
    /// Locator that probes PATH and, on Windows, the legacy locations.
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
            override_path: None,
        }
    }

    /// Locator pinned to an explicit executable. Probing is skipped, but
    /// the binary is still version-validated before being trusted.
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: Mutex::new(None),
            override_path: Some(path.into()),
        }
    }

    /// Discover the interpreter, reusing the cached answer unless
    /// `force_refresh` is set.
    ///
    /// "Nothing installed" is a success case: the returned info has
    /// `available = false` and empty fields. An explicit override that
    /// fails validation is an error, because the caller asserted a
    /// binary that turned out not to be one.
    pub fn detect(&self, force_refresh: bool) -> Result<InterpreterInfo, RampartError> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !force_refresh {
            if let Some(info) = cache.as_ref() {
                return Ok(info.clone());
            }
        }

        let info = match &self.override_path {
            Some(path) => probe_interpreter(path).ok_or_else(|| {
                RampartError::InvalidExecutableOverride(format!(
                    "{} did not answer the version query",
                    path.display()
                ))
            })?,
            None => discover(),
        };

        tracing::info!(
            available = info.available,
            version = %info.version,
            edition = %info.edition,
            path = %info.executable_path,
            "interpreter detection complete"
        );
        *cache = Some(info.clone());
        Ok(info)
    }
}

impl Default for InterpreterLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe PATH, then (on Windows) the legacy locations.
fn discover() -> InterpreterInfo {
    if let Ok(path) = which::which("pwsh") {
        if let Some(info) = probe_interpreter(&path) {
            return info;
        }
    }

    if Platform::current() == Platform::Windows {
        for candidate in LEGACY_WINDOWS_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                if let Some(info) = probe_interpreter(path) {
                    return info;
                }
            }
        }
    }

    InterpreterInfo::unavailable()
}

/// Run the version query against one candidate binary.
///
/// Any failure -- spawn refusal, timeout, nonzero exit, unparseable
/// output -- is a failed probe (`None`), never a crash.
fn probe_interpreter(path: &Path) -> Option<InterpreterInfo> {
    let mut cmd = Command::new(path);
    cmd.args([
        "-NoProfile",
        "-NoLogo",
        "-NonInteractive",
        "-Command",
        "$PSVersionTable | ConvertTo-Json",
    ]);

    let run = match run_with_deadline(&mut cmd, PROBE_TIMEOUT) {
        Ok(run) => run,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "version probe failed to spawn");
            return None;
        }
    };

    match run.outcome {
        WaitOutcome::Exited(status) if status.success() => {}
        WaitOutcome::Exited(status) => {
            tracing::debug!(
                path = %path.display(),
                code = status.code().unwrap_or(-1),
                "version probe exited nonzero"
            );
            return None;
        }
        WaitOutcome::TimedOut => {
            tracing::warn!(path = %path.display(), "version probe timed out");
            return None;
        }
    }

    let stdout = String::from_utf8_lossy(&run.stdout);
    let (version, edition) = parse_version_output(&stdout)?;
    let major = major_version(&version);

    Some(InterpreterInfo {
        supports_modern_features: major >= 7,
        executable_path: path.display().to_string(),
        platform: Platform::current(),
        available: true,
        version,
        edition,
    })
}

/// Parse `$PSVersionTable | ConvertTo-Json` output.
///
/// Tolerates both shapes the interpreter emits: `PSVersion` as a plain
/// string (legacy) or as an object with `Major`/`Minor`/`Patch` fields.
/// Anything else is a failed parse, reported as `None`.
fn parse_version_output(output: &str) -> Option<(String, String)> {
    let table: serde_json::Value = serde_json::from_str(output.trim()).ok()?;

    let version = match table.get("PSVersion")? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(fields) => {
            let major = fields.get("Major").and_then(serde_json::Value::as_i64)?;
            let minor = fields
                .get("Minor")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            let patch = fields
                .get("Patch")
                .or_else(|| fields.get("Build"))
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            format!("{major}.{minor}.{patch}")
        }
        _ => return None,
    };

    let edition = table
        .get("PSEdition")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            // Editions predate the field itself: 5.x and earlier are
            // always the Desktop edition.
            if major_version(&version) >= 6 {
                "Core".to_string()
            } else {
                "Desktop".to_string()
            }
        });

    Some((version, edition))
}

/// Leading integer of a dotted version string; 0 when absent.
fn major_version(version: &str) -> u32 {
    version
        .split('.')
        .next()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}
