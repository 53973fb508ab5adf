//! Error types shared across all Rampart crates.

/// Errors that can occur across the Rampart pipeline.
///
/// Policy rejections (blocked command, missing elevation) are normally
/// carried as data inside a `ValidationResult`; the corresponding variants
/// here exist for the execution layer's defense-in-depth checks, which
/// refuse to run anything that did not pass validation. Infrastructure
/// faults (missing interpreter, unreachable container engine, spawn
/// failure) are always surfaced as errors so callers can decide between
/// fallback and abort.
#[derive(Debug, thiserror::Error)]
pub enum RampartError {
    /// The command string was empty or whitespace-only.
    #[error("empty command")]
    EmptyCommand,

    /// The command matched a dangerous signature and was blocked by policy.
    #[error("command blocked: {}", reasons.join("; "))]
    CommandBlocked {
        /// Human-readable reasons, one per matched rule.
        reasons: Vec<String>,
    },

    /// The command requires elevated privileges the process does not hold.
    #[error("command requires elevation")]
    ElevationRequired,

    /// No usable shell interpreter was found on this system.
    #[error("no shell interpreter available")]
    InterpreterUnavailable,

    /// The subprocess exceeded its wall-clock timeout and was killed.
    #[error("execution timed out after {timeout_secs}s")]
    ExecutionTimeout { timeout_secs: u64 },

    /// The subprocess exited with a nonzero code.
    #[error("execution failed with exit code {code}")]
    ExecutionFailed { code: i32 },

    /// The container engine is not installed or not running.
    #[error("sandbox unavailable: {0}")]
    SandboxUnavailable(String),

    /// The container engine faulted (distinct from the command failing).
    #[error("sandbox failure: {0}")]
    SandboxFailure(String),

    /// A caller-supplied interpreter path failed version validation.
    #[error("invalid interpreter override: {0}")]
    InvalidExecutableOverride(String),

    /// The subprocess could not be spawned at all.
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// Configuration could not be parsed or is internally inconsistent.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
