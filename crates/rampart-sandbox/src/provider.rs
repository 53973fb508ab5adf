//! The sandbox capability boundary.

use std::time::Duration;

use rampart_policy::ApprovedCommand;
use rampart_types::{ExecutionResult, RampartError};

/// An OS-level isolation provider with resource limits.
///
/// The coordinator's logic depends on this abstraction rather than on a
/// "sandbox enabled" flag: when sandboxing is off the pipeline carries a
/// [`DisabledSandbox`](crate::DisabledSandbox) instead of branching.
///
/// `execute` must fail fast with [`RampartError::SandboxUnavailable`]
/// when the isolation engine cannot be reached -- falling back to
/// unsandboxed execution is the caller's decision, never this trait's.
pub trait SandboxProvider: Send + Sync {
    /// Whether the isolation engine is usable. Probed lazily on first
    /// call and memoized for the process lifetime; a failed probe stays
    /// failed (no retry storms).
    fn is_available(&self) -> bool;

    /// Run a validated command inside the isolation boundary with a hard
    /// wall-clock timeout. Timeout is reported as a distinct state on the
    /// result (`timed_out = true`), not as a command failure.
    fn execute(
        &self,
        approved: &ApprovedCommand,
        timeout: Duration,
    ) -> Result<ExecutionResult, RampartError>;
}

/// The no-op provider used when sandboxing is disabled.
///
/// Never available; `execute` returns a structured error so a
/// misconfigured caller cannot silently run a command it believed was
/// isolated.
pub struct DisabledSandbox;

impl SandboxProvider for DisabledSandbox {
    fn is_available(&self) -> bool {
        false
    }

    fn execute(
        &self,
        _approved: &ApprovedCommand,
        _timeout: Duration,
    ) -> Result<ExecutionResult, RampartError> {
        Err(RampartError::SandboxUnavailable(
            "sandboxing is disabled in configuration".into(),
        ))
    }
}
