//! Blocking child-process execution with a deadline.
//!
//! Output is redirected into anonymous temporary files so the child can
//! never block on a full pipe while we poll it from a single thread.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub(crate) enum Completion {
    Exited(ExitStatus),
    TimedOut,
}

#[derive(Debug)]
pub(crate) struct CapturedRun {
    pub completion: Completion,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RunError {
    /// The program could not be started (missing, not executable, ...).
    #[error("failed to launch: {0}")]
    Launch(#[source] std::io::Error),
    /// The program ran but its output or exit status could not be collected.
    #[error("failed to capture output: {0}")]
    Capture(#[source] std::io::Error),
}

/// Run `command` to completion or until `timeout` elapses.
///
/// On timeout the child is killed and reaped; whatever it wrote so far is
/// still returned.
pub(crate) fn run_captured(command: &mut Command, timeout: Duration) -> Result<CapturedRun, RunError> {
    let mut stdout_file = tempfile::tempfile().map_err(RunError::Capture)?;
    let mut stderr_file = tempfile::tempfile().map_err(RunError::Capture)?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone().map_err(RunError::Capture)?))
        .stderr(Stdio::from(stderr_file.try_clone().map_err(RunError::Capture)?));

    let mut child = command.spawn().map_err(RunError::Launch)?;
    // A timeout too large to represent as an Instant never expires.
    let deadline = Instant::now().checked_add(timeout);

    let completion = loop {
        if let Some(status) = child.try_wait().map_err(RunError::Capture)? {
            break Completion::Exited(status);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            child.wait().map_err(RunError::Capture)?;
            break Completion::TimedOut;
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    Ok(CapturedRun {
        completion,
        stdout: read_back(&mut stdout_file).map_err(RunError::Capture)?,
        stderr: read_back(&mut stderr_file).map_err(RunError::Capture)?,
    })
}

fn read_back(file: &mut File) -> std::io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
