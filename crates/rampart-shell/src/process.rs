//! Shared subprocess plumbing: bounded waits and pipe draining.
//!
//! Both the version probe and the executor spawn children with piped
//! output and a hard deadline. The pipes are drained on background
//! threads so a chatty child can never deadlock against a full pipe
//! buffer while the deadline loop polls `try_wait`.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use rampart_types::RampartError;

/// Polling interval for the deadline loop.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// How a bounded wait ended.
#[derive(Debug)]
pub(crate) enum WaitOutcome {
    /// Child exited on its own with this status.
    Exited(std::process::ExitStatus),
    /// Deadline hit; the child was killed.
    TimedOut,
}

/// Everything captured from one bounded subprocess run.
#[derive(Debug)]
pub(crate) struct CapturedRun {
    pub outcome: WaitOutcome,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

/// Spawn `cmd` with piped output and await it under a hard deadline.
///
/// The deadline is enforced by the runtime (`kill` on expiry), not
/// cooperatively. Reader threads are always joined, so file handles are
/// closed on every exit path.
pub(crate) fn run_with_deadline(
    cmd: &mut Command,
    timeout: Duration,
) -> Result<CapturedRun, RampartError> {
    let start = Instant::now();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RampartError::SpawnError(e.to_string()))?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let outcome = wait_with_deadline(&mut child, timeout);
    let duration = start.elapsed();

    Ok(CapturedRun {
        outcome,
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
        duration,
    })
}

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
            Err(e) => {
                // A failed wait leaves no status to report; treat it as a
                // kill-and-collect so the child cannot be orphaned.
                tracing::warn!(error = %e, "wait on child failed, killing");
                let _ = child.kill();
                let _ = child.wait();
                return WaitOutcome::TimedOut;
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(
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

fn join_reader(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
