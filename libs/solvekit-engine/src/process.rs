/// Child Process Supervision
///
/// **Responsibility:**
/// Spawn compilers and solutions, feed stdin, capture stdout/stderr.
///
/// **Timeout contract:**
/// spawn, race the child against a timer, and on timer win kill the child
/// and classify the run as [`ExitOutcome::TimedOut`]. Whatever output the
/// child produced before being killed is kept, up to [`MAX_CAPTURE_BYTES`]
/// per stream.
///
/// This module knows nothing about languages or expected outputs.
use crate::error::{EngineError, Result};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long to keep draining pipes once the child is gone. Grandchildren
/// that inherited the pipes would otherwise keep the readers alive.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Bytes kept per stream. Anything past this is read and discarded so the
/// child never blocks on a full pipe.
pub const MAX_CAPTURE_BYTES: usize = 16 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code or killed by a signal
    Failure {
        code: Option<i32>,
        signal: Option<i32>,
    },
    TimedOut,
}

impl ExitOutcome {
    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return ExitOutcome::Success;
        }
        ExitOutcome::Failure {
            code: status.code(),
            signal: exit_signal(&status),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ExitOutcome::Success => "exited successfully".to_string(),
            ExitOutcome::TimedOut => "killed after exceeding the time limit".to_string(),
            ExitOutcome::Failure { code: Some(code), .. } => format!("exited with code {}", code),
            ExitOutcome::Failure { signal: Some(11), .. } => {
                "killed by signal 11 (segmentation fault)".to_string()
            }
            ExitOutcome::Failure { signal: Some(signal), .. } => {
                format!("killed by signal {}", signal)
            }
            ExitOutcome::Failure { .. } => "terminated abnormally".to_string(),
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Raw output of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub outcome: ExitOutcome,
    /// stdout or stderr hit [`MAX_CAPTURE_BYTES`]
    pub truncated: bool,
}

/// Fail early when a required binary is missing from PATH
pub fn ensure_command(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| EngineError::CommandNotAvailable(program.to_string()))
}

/// Run a compiler to completion; a non-zero exit becomes a compile failure
/// carrying the compiler's diagnostics unmodified.
pub async fn run_compiler(mut command: Command) -> Result<Duration> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = ?command.as_std(), "Invoking compiler");
    let start = Instant::now();
    let output = command.output().await?;
    let elapsed = start.elapsed();

    if !output.status.success() {
        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stdout));
        warn!(
            compilation_ms = elapsed.as_millis() as u64,
            error_preview = diagnostics.lines().next().unwrap_or(""),
            "Compilation failed"
        );
        return Err(EngineError::CompileFailure { diagnostics });
    }

    debug!(compilation_ms = elapsed.as_millis() as u64, "Compilation succeeded");
    Ok(elapsed)
}

/// Spawn `command`, write `stdin` to it and supervise it under `limit`
pub async fn run_with_input(command: Command, stdin: &str, limit: Option<Duration>) -> Result<ExecutionOutput> {
    supervise(command, stdin, limit, MAX_CAPTURE_BYTES).await
}

async fn supervise(
    mut command: Command,
    stdin: &str,
    limit: Option<Duration>,
    capture_limit: usize,
) -> Result<ExecutionOutput> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = command.spawn()?;

    let input = stdin.as_bytes().to_vec();
    let writer = child.stdin.take().map(|mut pipe| {
        tokio::spawn(async move {
            // The child may legitimately exit without reading its input
            if let Err(e) = pipe.write_all(&input).await {
                debug!(error = %e, "stdin not fully consumed");
            }
        })
    });
    let stdout_reader = spawn_reader(child.stdout.take(), capture_limit);
    let stderr_reader = spawn_reader(child.stderr.take(), capture_limit);

    let status = match limit {
        Some(limit) => {
            tokio::select! {
                status = child.wait() => Some(status?),
                _ = tokio::time::sleep(limit) => None,
            }
        }
        None => Some(child.wait().await?),
    };

    let outcome = match status {
        Some(status) => ExitOutcome::from_status(status),
        None => {
            warn!(timeout = ?limit, "Execution timed out, killing child");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill timed-out child");
            }
            ExitOutcome::TimedOut
        }
    };
    let elapsed = start.elapsed();

    if let Some(writer) = writer {
        writer.abort();
    }
    let stdout = drain(stdout_reader).await;
    let stderr = drain(stderr_reader).await;
    let truncated = stdout.truncated || stderr.truncated;
    if truncated {
        warn!(limit_bytes = capture_limit, "Captured output truncated");
    }

    Ok(ExecutionOutput {
        stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
        elapsed,
        outcome,
        truncated,
    })
}

#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    truncated: bool,
}

impl Capture {
    fn push(&mut self, chunk: &[u8], limit: usize) {
        let room = limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.bytes.extend_from_slice(&chunk[..room]);
            self.truncated = true;
        } else {
            self.bytes.extend_from_slice(chunk);
        }
    }
}

/// Bytes land in the shared buffer as they arrive, so an aborted reader
/// still leaves everything read so far behind.
struct PipeReader {
    capture: Arc<Mutex<Capture>>,
    task: JoinHandle<()>,
}

fn spawn_reader<R>(pipe: Option<R>, limit: usize) -> PipeReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let capture = Arc::new(Mutex::new(Capture::default()));
    let sink = Arc::clone(&capture);
    let task = tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => sink.lock().await.push(&chunk[..n], limit),
                Err(e) => {
                    debug!(error = %e, "Pipe read interrupted");
                    break;
                }
            }
        }
    });
    PipeReader { capture, task }
}

async fn drain(reader: PipeReader) -> Capture {
    let PipeReader { capture, mut task } = reader;
    match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Pipe reader task failed"),
        Err(_) => {
            debug!("Pipe still open after the child exited, keeping what was read");
            task.abort();
        }
    }
    let mut guard = capture.lock().await;
    std::mem::take(&mut *guard)
}
