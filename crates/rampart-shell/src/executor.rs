//! Direct (unsandboxed) command execution through the interpreter.
//!
//! Builds a non-interactive argument vector, layers the environment,
//! enforces a hard wall-clock timeout with forced kill, and converts the
//! raw process result into an [`ExecutionResult`] tagged for audit
//! consumers. Only commands that passed validation can reach this module:
//! the API takes an [`ApprovedCommand`], which nothing but the security
//! coordinator can mint.

use std::process::Command;
use std::time::Duration;

use chrono::Utc;
use rampart_policy::ApprovedCommand;
use rampart_types::{
    ExecutionResult, ExecutorConfig, InterpreterInfo, Platform, RampartError, ShellContext,
};

use crate::locator::InterpreterLocator;
use crate::process::{run_with_deadline, WaitOutcome};

/// Marker appended to output cut at the byte ceiling.
const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Executes validated commands as interpreter subprocesses.
pub struct ShellExecutor {
    locator: InterpreterLocator,
    config: ExecutorConfig,
}

impl ShellExecutor {
    /// Executor over the given configuration. Uses the configured
    /// explicit interpreter path when present, discovery otherwise.
    pub fn new(config: ExecutorConfig) -> Self {
        let locator = match &config.interpreter_path {
            Some(path) => InterpreterLocator::with_override(path.clone()),
            None => InterpreterLocator::new(),
        };
        Self { locator, config }
    }

    /// Executor with an injected locator (tests).
    pub fn with_locator(locator: InterpreterLocator, config: ExecutorConfig) -> Self {
        Self { locator, config }
    }

    /// The interpreter this executor would use.
    pub fn interpreter(&self) -> Result<InterpreterInfo, RampartError> {
        self.locator.detect(false)
    }

    /// Like [`interpreter`](Self::interpreter), but a missing interpreter
    /// is a hard [`RampartError::InterpreterUnavailable`] instead of an
    /// `available = false` value. For embedders that abort (or switch to
    /// the sandbox) when the host has no shell at all.
    pub fn ensure_interpreter(&self) -> Result<InterpreterInfo, RampartError> {
        let info = self.locator.detect(false)?;
        if !info.available {
            return Err(RampartError::InterpreterUnavailable);
        }
        Ok(info)
    }

    /// Run a validated command with the default configured timeout.
    pub fn execute(
        &self,
        approved: &ApprovedCommand,
        context: &ShellContext,
    ) -> Result<ExecutionResult, RampartError> {
        self.execute_with_timeout(
            approved,
            context,
            Duration::from_secs(self.config.timeout_secs),
        )
    }

    /// Run a validated command with an explicit timeout.
    ///
    /// Timeout is enforced by killing the subprocess; the result is
    /// marked `timed_out = true`, distinct from a nonzero exit. When no
    /// interpreter is available the command never runs and the result
    /// fails fast with `return_code = -1`.
    pub fn execute_with_timeout(
        &self,
        approved: &ApprovedCommand,
        context: &ShellContext,
        timeout: Duration,
    ) -> Result<ExecutionResult, RampartError> {
        // Defense in depth: the token cannot exist for a blocked command,
        // but execution refuses to trust that alone.
        if !approved.validation().allowed {
            return Err(RampartError::CommandBlocked {
                reasons: approved.validation().blocked_reasons.clone(),
            });
        }

        let interpreter = self.locator.detect(false)?;
        if !interpreter.available {
            tracing::warn!("execution refused: no shell interpreter available");
            let mut result = ExecutionResult::not_run("no shell interpreter available");
            result.warnings.push("interpreter unavailable".to_string());
            return Ok(result);
        }

        let mut cmd = Command::new(&interpreter.executable_path);
        cmd.args(build_interpreter_args(&interpreter, approved.command()));
        cmd.current_dir(&context.working_dir);
        // Base OS environment is inherited; context overrides layer on
        // top, executor-level overrides win last.
        cmd.envs(&context.env_overrides);
        cmd.envs(&self.config.env_overrides);

        tracing::info!(
            session = %context.session_id,
            command = approved.command(),
            timeout_secs = timeout.as_secs(),
            "executing command"
        );

        let run = run_with_deadline(&mut cmd, timeout)?;
        let duration_ms = run.duration.as_secs_f64() * 1000.0;

        let mut warnings = Vec::new();
        let (stdout, stdout_truncated) =
            decode_and_bound(&run.stdout, self.config.max_output_bytes);
        let (stderr, stderr_truncated) =
            decode_and_bound(&run.stderr, self.config.max_output_bytes);
        if stdout_truncated {
            warnings.push(format!(
                "stdout truncated to {} bytes",
                self.config.max_output_bytes
            ));
        }
        if stderr_truncated {
            warnings.push(format!(
                "stderr truncated to {} bytes",
                self.config.max_output_bytes
            ));
        }

        let result = match run.outcome {
            WaitOutcome::Exited(status) => {
                let return_code = status.code().unwrap_or(-1);
                ExecutionResult {
                    success: return_code == 0,
                    return_code,
                    stdout,
                    stderr,
                    duration_ms,
                    platform: Platform::current(),
                    sandbox_used: false,
                    timed_out: false,
                    interpreter_version: interpreter.version.clone(),
                    warnings,
                    timestamp: Utc::now(),
                }
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    session = %context.session_id,
                    command = approved.command(),
                    timeout_secs = timeout.as_secs(),
                    "command exceeded timeout and was killed"
                );
                warnings.push(format!(
                    "command killed after exceeding {}s timeout",
                    timeout.as_secs()
                ));
                ExecutionResult {
                    success: false,
                    return_code: -1,
                    stdout,
                    stderr,
                    duration_ms,
                    platform: Platform::current(),
                    sandbox_used: false,
                    timed_out: true,
                    interpreter_version: interpreter.version.clone(),
                    warnings,
                    timestamp: Utc::now(),
                }
            }
        };

        Ok(result)
    }
}

/// Argument vector for one command: suppress profiles, logos, and
/// prompts; bypass the execution policy only for the legacy Desktop
/// interpreter on its native OS; command text last.
fn build_interpreter_args(interpreter: &InterpreterInfo, command: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-NoProfile".into(),
        "-NoLogo".into(),
        "-NonInteractive".into(),
    ];
    if interpreter.is_legacy_desktop() && interpreter.platform == Platform::Windows {
        args.push("-ExecutionPolicy".into());
        args.push("Bypass".into());
    }
    args.push("-Command".into());
    args.push(command.to_string());
    args
}

/// Decode bytes lossily and cut at the byte ceiling.
///
/// Truncation is a pure function of size: the cut lands on the nearest
/// char boundary at or below the ceiling and appends a marker. Invalid
/// UTF-8 is replaced, never an error.
fn decode_and_bound(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max_bytes {
        return (text.into_owned(), false);
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut bounded = text[..end].to_string();
    bounded.push_str(TRUNCATION_MARKER);
    (bounded, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_policy::{PermissionChecker, RiskClassifier, SecurityCoordinator};

    fn approve(command: &str) -> ApprovedCommand {
        let coordinator = SecurityCoordinator::with_components(
            RiskClassifier::with_defaults(),
            PermissionChecker::new(),
            false,
        );
        coordinator
            .authorize(command, &ShellContext::new(std::env::temp_dir()))
            .expect("command should authorize")
    }

    fn pwsh_available() -> bool {
        which::which("pwsh").is_ok()
    }

    // ---- Argument construction ----

    #[test]
    fn modern_interpreter_args_have_no_policy_bypass() {
        let info = InterpreterInfo {
            version: "7.4.6".into(),
            edition: "Core".into(),
            executable_path: "/usr/bin/pwsh".into(),
            supports_modern_features: true,
            platform: Platform::Linux,
            available: true,
        };
        let args = build_interpreter_args(&info, "Get-Process");
        assert_eq!(
            args,
            vec!["-NoProfile", "-NoLogo", "-NonInteractive", "-Command", "Get-Process"]
        );
    }

    #[test]
    fn legacy_interpreter_on_windows_gets_policy_bypass() {
        let info = InterpreterInfo {
            version: "5.1.19041.1".into(),
            edition: "Desktop".into(),
            executable_path: r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe".into(),
            supports_modern_features: false,
            platform: Platform::Windows,
            available: true,
        };
        let args = build_interpreter_args(&info, "Get-Date");
        let pos = args.iter().position(|a| a == "-ExecutionPolicy").unwrap();
        assert_eq!(args[pos + 1], "Bypass");
        // Command text is always the final argument.
        assert_eq!(args.last().map(String::as_str), Some("Get-Date"));
    }

    #[test]
    fn legacy_edition_off_windows_gets_no_bypass() {
        let info = InterpreterInfo {
            version: "5.1.0.0".into(),
            edition: "Desktop".into(),
            executable_path: "/opt/powershell".into(),
            supports_modern_features: false,
            platform: Platform::Linux,
            available: true,
        };
        let args = build_interpreter_args(&info, "Get-Date");
        assert!(!args.iter().any(|a| a == "-ExecutionPolicy"));
    }

    // ---- Truncation ----

    #[test]
    fn truncation_depends_only_on_size() {
        let (text, truncated) = decode_and_bound(b"short output", 1024);
        assert_eq!(text, "short output");
        assert!(!truncated);

        let big = vec![b'x'; 2048];
        let (text, truncated) = decode_and_bound(&big, 1024);
        assert!(truncated);
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert!(text.len() <= 1024 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // "é" is two bytes; a ceiling landing mid-char must back off.
        let input = "é".repeat(100).into_bytes();
        let (text, truncated) = decode_and_bound(&input, 33);
        assert!(truncated);
        let body = text.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(body.len(), 32);
        assert!(body.chars().all(|c| c == 'é'));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let (text, truncated) = decode_and_bound(&[0xff, 0xfe, b'o', b'k'], 1024);
        assert!(!truncated);
        assert!(text.contains("ok"));
        assert!(text.contains('\u{fffd}'));
    }

    // ---- Unavailable interpreter ----

    #[test]
    fn ensure_interpreter_errors_when_missing() {
        let locator = InterpreterLocator::new();
        if locator.detect(false).unwrap().available {
            return;
        }
        let executor = ShellExecutor::with_locator(locator, ExecutorConfig::default());
        let err = executor.ensure_interpreter().unwrap_err();
        assert!(matches!(err, RampartError::InterpreterUnavailable));
    }

    #[test]
    fn missing_interpreter_fails_fast_with_minus_one() {
        let locator = InterpreterLocator::new();
        // Skip when the machine actually has pwsh; this test is about
        // the unavailable path.
        if locator.detect(false).unwrap().available {
            return;
        }
        let executor = ShellExecutor::with_locator(locator, ExecutorConfig::default());
        let result = executor
            .execute(&approve("Get-Process"), &ShellContext::new("/tmp"))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.return_code, -1);
        assert!(!result.timed_out);
    }

    // ---- Live interpreter tests (skipped when pwsh is absent) ----

    #[test]
    fn successful_command_maps_exit_zero() {
        if !pwsh_available() {
            return;
        }
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let result = executor
            .execute(&approve("echo hello"), &ShellContext::new(std::env::temp_dir()))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.return_code, 0);
        assert!(result.stdout.contains("hello"));
        assert!(!result.sandbox_used);
        assert!(!result.interpreter_version.is_empty());
    }

    #[test]
    fn failing_command_maps_nonzero_exit() {
        if !pwsh_available() {
            return;
        }
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let result = executor
            .execute(&approve("exit 7"), &ShellContext::new(std::env::temp_dir()))
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.return_code, 7);
        assert!(!result.timed_out);
    }

    #[test]
    fn long_running_command_times_out_distinctly() {
        if !pwsh_available() {
            return;
        }
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let start = std::time::Instant::now();
        let result = executor
            .execute_with_timeout(
                &approve("Start-Sleep -Seconds 10"),
                &ShellContext::new(std::env::temp_dir()),
                Duration::from_secs(1),
            )
            .unwrap();
        assert!(result.timed_out, "result must be marked as timed out");
        assert!(!result.success);
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timeout must return promptly, took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn context_env_overrides_reach_the_command() {
        if !pwsh_available() {
            return;
        }
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let ctx = ShellContext::new(std::env::temp_dir()).with_env("RAMPART_PROBE", "42");
        let result = executor
            .execute(&approve("echo $env:RAMPART_PROBE"), &ctx)
            .unwrap();
        assert!(result.stdout.contains("42"));
    }
}
