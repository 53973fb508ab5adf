//! Docker container sandbox provider.
//!
//! Runs commands inside hardened, ephemeral containers:
//! - All capabilities dropped (`--cap-drop=ALL`)
//! - No new privileges (`--security-opt=no-new-privileges`)
//! - Network disabled by default (`--network=none`)
//! - Read-only root filesystem with a size-limited tmpfs at `/tmp`
//! - PID, memory, and CPU ceilings
//! - Workspace mounted read-only unless configured otherwise
//!
//! Containers are named so the cleanup path can `docker rm -f` them even
//! after a timeout kill of the CLI client, where `--rm` alone would leak
//! the container.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use rampart_policy::ApprovedCommand;
use rampart_types::{ExecutionResult, Platform, RampartError, SandboxConfig};

use crate::provider::SandboxProvider;

/// Ceiling on captured container output, matching the executor's default.
const MAX_OUTPUT_BYTES: usize = 1_048_576;

/// Polling interval for the deadline loop.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Docker-backed [`SandboxProvider`].
pub struct DockerSandbox {
    config: SandboxConfig,
    /// Memoized engine availability. `None` until first probed; a failed
    /// probe is sticky for the life of this instance.
    availability: Mutex<Option<bool>>,
}

impl DockerSandbox {
    /// Provider over the given sandbox configuration. No engine calls are
    /// made until the first `is_available` or `execute`.
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            availability: Mutex::new(None),
        }
    }

    /// Probe the engine once: `docker info` exiting 0 means usable.
    fn probe_engine() -> bool {
        match Command::new("docker")
            .arg("info")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, "docker binary not reachable");
                false
            }
        }
    }

    /// How the command is handed to a shell inside the container.
    fn container_shell(&self) -> Vec<String> {
        if self.config.image.contains("powershell") {
            vec![
                "pwsh".into(),
                "-NoProfile".into(),
                "-NonInteractive".into(),
                "-Command".into(),
            ]
        } else {
            vec!["/bin/sh".into(), "-c".into()]
        }
    }

    /// Force-remove the named container, tolerating "already gone".
    fn remove_container(name: &str) {
        match Command::new("docker")
            .args(["rm", "-f", name])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => tracing::debug!(container = name, "container cleanup complete"),
            Err(e) => tracing::warn!(container = name, error = %e, "container cleanup failed"),
        }
    }
}

impl SandboxProvider for DockerSandbox {
    fn is_available(&self) -> bool {
        let mut cached = match self.availability.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cached.get_or_insert_with(|| {
            let usable = Self::probe_engine();
            tracing::info!(usable, "docker availability probed");
            usable
        })
    }

    fn execute(
        &self,
        approved: &ApprovedCommand,
        timeout: Duration,
    ) -> Result<ExecutionResult, RampartError> {
        // Defense in depth: the token cannot exist for a blocked command,
        // but execution refuses to trust that alone.
        if !approved.validation().allowed {
            return Err(RampartError::CommandBlocked {
                reasons: approved.validation().blocked_reasons.clone(),
            });
        }

        if !self.is_available() {
            return Err(RampartError::SandboxUnavailable(
                "container engine is not installed or not running".into(),
            ));
        }

        let container_name = format!("rampart-{}", uuid::Uuid::new_v4().simple());
        let args = build_docker_args(
            &container_name,
            approved.command(),
            &self.container_shell(),
            &self.config,
        )?;

        tracing::info!(
            container = %container_name,
            image = %self.config.image,
            command = approved.command(),
            "running command in docker sandbox"
        );

        let start = Instant::now();
        let mut child = Command::new("docker")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RampartError::SandboxFailure(format!("failed to spawn docker client: {e}"))
            })?;

        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let waited = wait_with_deadline(&mut child, timeout);
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        // Cleanup runs on every path: success, failure, and timeout.
        Self::remove_container(&container_name);

        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);

        match waited {
            WaitOutcome::Exited(status) => {
                let return_code = status.code().unwrap_or(-1);
                Ok(ExecutionResult {
                    success: status.success(),
                    return_code,
                    stdout,
                    stderr,
                    duration_ms,
                    platform: Platform::current(),
                    sandbox_used: true,
                    timed_out: false,
                    interpreter_version: String::new(),
                    warnings: Vec::new(),
                    timestamp: Utc::now(),
                })
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    container = %container_name,
                    timeout_secs = timeout.as_secs(),
                    "sandboxed command exceeded timeout and was killed"
                );
                Ok(ExecutionResult {
                    success: false,
                    return_code: -1,
                    stdout,
                    stderr,
                    duration_ms,
                    platform: Platform::current(),
                    sandbox_used: true,
                    timed_out: true,
                    interpreter_version: String::new(),
                    warnings: vec![format!(
                        "command killed after exceeding {}s timeout",
                        timeout.as_secs()
                    )],
                    timestamp: Utc::now(),
                })
            }
            WaitOutcome::WaitFailed(e) => Err(RampartError::SandboxFailure(format!(
                "failed to await docker client: {e}"
            ))),
        }
    }
}

enum WaitOutcome {
    Exited(std::process::ExitStatus),
    TimedOut,
    WaitFailed(std::io::Error),
}

/// Poll the child until exit or deadline; kill on deadline.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> WaitOutcome {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return WaitOutcome::TimedOut;
                }
                std::thread::sleep(WAIT_POLL);
            }
            Err(e) => return WaitOutcome::WaitFailed(e),
        }
    }
}

/// Drain a pipe on a background thread so the child never blocks on a
/// full pipe buffer while the deadline loop polls.
fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Option<std::thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut r| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_pipe_reader(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let slice = if bytes.len() > MAX_OUTPUT_BYTES {
        &bytes[..MAX_OUTPUT_BYTES]
    } else {
        &bytes[..]
    };
    String::from_utf8_lossy(slice).into_owned()
}

/// Build the full `docker` argv for one sandboxed command.
///
/// Exposed so tests can assert the security flags without a running
/// engine.
pub fn build_docker_args(
    container_name: &str,
    command: &str,
    shell: &[String],
    config: &SandboxConfig,
) -> Result<Vec<String>, RampartError> {
    validate_image_name(&config.image)?;
    validate_network_mode(&config.network)?;
    let workspace = config.workspace_dir.to_string_lossy();
    validate_workspace_path(&workspace)?;

    let mount_mode = if config.workspace_writable { "rw" } else { "ro" };

    let mut args: Vec<String> = vec![
        "run".into(),
        "--name".into(),
        container_name.into(),
        "--rm".into(),
        "--cap-drop=ALL".into(),
        "--security-opt=no-new-privileges".into(),
        "--read-only".into(),
        format!("--network={}", config.network),
        "--tmpfs".into(),
        format!("/tmp:size={}", config.tmpfs_size),
        format!("--pids-limit={}", config.pids_limit),
        format!("--memory={}", config.memory),
        format!("--cpus={}", config.cpus),
        "-v".into(),
        format!("{workspace}:/workspace:{mount_mode}"),
        "-w".into(),
        "/workspace".into(),
    ];

    args.push(config.image.clone());
    args.extend(shell.iter().cloned());
    args.push(command.to_string());

    Ok(args)
}

/// Reject image references that could smuggle extra client arguments.
///
/// Alphanumerics plus `- . : / _ @` cover standard references like
/// `ubuntu:22.04`, `ghcr.io/owner/repo:v1`, and digest pins.
fn validate_image_name(image: &str) -> Result<(), RampartError> {
    if image.is_empty() || image.len() > 256 {
        return Err(RampartError::SandboxFailure(
            "container image name must be 1-256 characters".into(),
        ));
    }
    if let Some(bad) = image
        .chars()
        .find(|c| !c.is_alphanumeric() && !"-.:_/@".contains(*c))
    {
        return Err(RampartError::SandboxFailure(format!(
            "container image name contains invalid character {bad:?}"
        )));
    }
    if image.starts_with(['-', '.', ':']) {
        return Err(RampartError::SandboxFailure(format!(
            "container image name cannot start with {:?}",
            &image[..1]
        )));
    }
    Ok(())
}

/// Network modes: `none`, `bridge`, `host`, or a custom network name.
fn validate_network_mode(network: &str) -> Result<(), RampartError> {
    if network.is_empty()
        || network
            .chars()
            .any(|c| !c.is_alphanumeric() && c != '-' && c != '_')
    {
        return Err(RampartError::SandboxFailure(format!(
            "invalid network mode {network:?}"
        )));
    }
    Ok(())
}

/// Reject traversal and injection in the workspace mount path.
fn validate_workspace_path(path: &str) -> Result<(), RampartError> {
    if path.is_empty() {
        return Err(RampartError::SandboxFailure(
            "workspace path cannot be empty".into(),
        ));
    }
    if path.contains(['\0', '\n', '\r']) {
        return Err(RampartError::SandboxFailure(
            "workspace path contains a control character".into(),
        ));
    }
    let has_traversal = std::path::Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if has_traversal {
        return Err(RampartError::SandboxFailure(
            "workspace path contains a '..' component".into(),
        ));
    }
    Ok(())
}
