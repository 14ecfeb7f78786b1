//! Subprocess plumbing shared by the command-line compilers.
//!
//! Provides [`run_command`]: spawn a prepared [`tokio::process::Command`],
//! feed the source on stdin, capture stdout/stderr and enforce a timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::CompileError;

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
}

/// Spawn `cmd`, write `stdin` to it, and wait at most `timeout`.
///
/// The caller sets the program and arguments. A non-zero exit is reported
/// in [`CommandOutput::exit_code`], not as an error.
pub async fn run_command(
    cmd: &mut Command,
    stdin: &[u8],
    timeout: Duration,
) -> Result<CommandOutput, CompileError> {
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(CompileError::Spawn)?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    // Readers must be running before the write, or a child that fills its
    // stdout pipe before draining stdin deadlocks.
    let mut pipe = child.stdin.take();
    let finished = async {
        if let Some(mut pipe) = pipe.take() {
            // Best-effort write; if the process closes stdin early, ignore the error.
            let _ = pipe.write_all(stdin).await;
        }
        child.wait().await
    };

    match tokio::time::timeout(timeout, finished).await {
        Ok(Ok(status)) => {
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();
            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code().unwrap_or(-1),
            })
        }
        Ok(Err(e)) => Err(CompileError::Spawn(e)),
        // `child` is dropped here, which kills the process.
        Err(_elapsed) => Err(CompileError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }),
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}
