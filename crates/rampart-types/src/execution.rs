//! Execution results and interpreter metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Platform, RampartError};

/// What the locator discovered about the installed shell interpreter.
///
/// Built once per process via lazy discovery and cached; invalidated only
/// by an explicit refresh. The "nothing installed" state is a valid value
/// (`available = false`, every string empty), not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterInfo {
    /// Version string as reported by the interpreter (e.g. `"7.4.6"`).
    pub version: String,
    /// Edition string (`"Core"` for pwsh, `"Desktop"` for the legacy
    /// Windows interpreter).
    pub edition: String,
    /// Absolute path to the interpreter binary.
    pub executable_path: String,
    /// Whether the interpreter supports the modern cross-platform feature
    /// set (major version 7 or later).
    pub supports_modern_features: bool,
    /// Platform the probe ran on.
    pub platform: Platform,
    /// Whether a usable interpreter was found at all.
    pub available: bool,
}

impl InterpreterInfo {
    /// The fully-specified "no interpreter found" state.
    pub fn unavailable() -> Self {
        Self {
            version: String::new(),
            edition: String::new(),
            executable_path: String::new(),
            supports_modern_features: false,
            platform: Platform::current(),
            available: false,
        }
    }

    /// Whether this is the legacy Desktop-edition interpreter, which needs
    /// an execution-policy bypass flag when invoked on Windows.
    pub fn is_legacy_desktop(&self) -> bool {
        self.available && self.edition.eq_ignore_ascii_case("desktop")
    }
}

/// The result of one execution attempt, direct or sandboxed.
///
/// Created once per attempt and handed to the caller; the audit and UI
/// layers read it but never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True iff the process exited with code 0 and did not time out.
    pub success: bool,
    /// Process exit code; `-1` when the process never ran or was killed
    /// before producing one.
    pub return_code: i32,
    /// Captured standard output, UTF-8 with replacement on invalid bytes,
    /// possibly truncated (see `warnings`).
    pub stdout: String,
    /// Captured standard error, decoded the same way.
    pub stderr: String,
    /// Wall-clock duration of the attempt in milliseconds.
    pub duration_ms: f64,
    /// Platform the command ran on.
    pub platform: Platform,
    /// Whether the command ran inside the isolation sandbox.
    pub sandbox_used: bool,
    /// True iff the process exceeded its wall-clock timeout and was
    /// killed. Distinct from a nonzero exit code.
    pub timed_out: bool,
    /// Version of the interpreter that ran the command (empty for
    /// sandboxed runs, which use the container image's shell).
    pub interpreter_version: String,
    /// Advisory notes: output truncation, encoding replacement.
    pub warnings: Vec<String>,
    /// When the attempt completed.
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    /// The hard-error view of this attempt, for callers that treat
    /// failed executions as aborts rather than data.
    ///
    /// Timeouts map to [`RampartError::ExecutionTimeout`], nonzero exits
    /// to [`RampartError::ExecutionFailed`]; a successful attempt has no
    /// error view.
    pub fn failure(&self) -> Option<RampartError> {
        if self.timed_out {
            return Some(RampartError::ExecutionTimeout {
                timeout_secs: (self.duration_ms / 1000.0) as u64,
            });
        }
        if !self.success {
            return Some(RampartError::ExecutionFailed {
                code: self.return_code,
            });
        }
        None
    }

    /// A result for a command that never ran (interpreter missing, spawn
    /// refused). `return_code` is `-1` by convention.
    pub fn not_run(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            return_code: -1,
            stdout: String::new(),
            stderr: reason.into(),
            duration_ms: 0.0,
            platform: Platform::current(),
            sandbox_used: false,
            timed_out: false,
            interpreter_version: String::new(),
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}
