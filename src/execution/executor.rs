//! Script execution engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use super::failure::ExecutionFailure;
use super::observer::{ExecutionObserver, TracingObserver};
use super::request::{ExecutionRequest, DEFAULT_TIMEOUT};
use super::result::{ExecutionResult, SENTINEL_EXIT_CODE};
use super::state::ExecutionState;

/// Default per-stream capture limit (10 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default interpreter used when none is configured.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Buffer size for reading child output.
const READ_BUFFER_SIZE: usize = 8192;

/// How long to wait for output pipes to close once the child has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Runs scripts under a fixed interpreter, one child process per call.
///
/// The executor holds no mutable state, so a single instance can be shared
/// behind an `Arc` and driven concurrently.
pub struct ScriptExecutor {
    interpreter: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
    observer: Arc<dyn ExecutionObserver>,
}

impl ScriptExecutor {
    /// Create an executor for the given interpreter with default limits.
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Set the timeout used by [`request`](Self::request).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-stream capture limit.
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Replace the observer that receives run events.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a request for `script` with this executor's interpreter and timeout.
    pub fn request(&self, script: impl Into<PathBuf>) -> ExecutionRequest {
        ExecutionRequest::new(self.interpreter.clone(), script).timeout(self.timeout)
    }

    /// Run one script to completion, timeout, or classified failure.
    ///
    /// Never fails: every failure is folded into the returned result with
    /// exit code `-1`. The child is reaped before this returns on every path.
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let start = Instant::now();
        let mut state = ExecutionState::Idle;
        advance(&mut state, ExecutionState::Launching);

        self.observer.launched(request);

        let result = match self.try_run(request, &mut state, start).await {
            Ok(result) => {
                self.observer.completed(request, &result);
                result
            }
            Err(failure) => {
                self.observer.failed(request, &failure);
                ExecutionResult::failed(&failure, start.elapsed())
            }
        };

        debug_assert!(state.is_terminal(), "run ended in {state:?}");
        advance(&mut state, ExecutionState::ResultReady);
        result
    }

    async fn try_run(
        &self,
        request: &ExecutionRequest,
        state: &mut ExecutionState,
        start: Instant,
    ) -> Result<ExecutionResult, ExecutionFailure> {
        let mut child = match spawn(request).await {
            Ok(child) => child,
            Err(failure) => {
                advance(state, ExecutionState::LaunchFailed);
                return Err(failure);
            }
        };
        advance(state, ExecutionState::Running);

        let pid = child.id();
        let limit = self.max_output_bytes;
        let (stop_tx, stop_rx) = watch::channel(false);
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), limit, stop_rx.clone()));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), limit, stop_rx));

        let waited = time::timeout(request.timeout, child.wait()).await;

        match waited {
            Ok(Ok(status)) => {
                advance(state, ExecutionState::Completed);
                let (stdout, stderr) = collect_output(pid, &stop_tx, stdout_task, stderr_task).await;
                Ok(ExecutionResult::completed(
                    String::from_utf8_lossy(&stdout).into_owned(),
                    String::from_utf8_lossy(&stderr).into_owned(),
                    exit_code(status),
                    start.elapsed(),
                ))
            }
            Ok(Err(err)) => {
                terminate(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                advance(state, ExecutionState::LaunchFailed);
                Err(ExecutionFailure::Unexpected { source: err })
            }
            Err(_elapsed) => {
                terminate(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                advance(state, ExecutionState::TimedOut);
                Err(ExecutionFailure::Timeout {
                    command: request.to_string(),
                    timeout: request.timeout,
                })
            }
        }
    }
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl fmt::Debug for ScriptExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptExecutor")
            .field("interpreter", &self.interpreter)
            .field("timeout", &self.timeout)
            .field("max_output_bytes", &self.max_output_bytes)
            .finish_non_exhaustive()
    }
}

/// Move the run to `next`; an illegal move is a bug in the executor.
fn advance(state: &mut ExecutionState, next: ExecutionState) {
    let moved = state.transition_to(next);
    debug_assert!(moved.is_ok(), "illegal execution state transition to {next:?}");
    if let Err(err) = moved {
        tracing::warn!(error = %err, "execution state machine out of step");
    }
}

/// Open the script, then spawn `[interpreter, script, args...]` with piped output.
async fn spawn(request: &ExecutionRequest) -> Result<Child, ExecutionFailure> {
    // Opened here so a missing or unreadable script is reported against its own path.
    tokio::fs::File::open(&request.script)
        .await
        .map_err(|e| ExecutionFailure::from_launch_error(&request.script, e))?;

    let mut cmd = Command::new(&request.interpreter);
    cmd.args(request.interpreter_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    cmd.spawn()
        .map_err(|e| ExecutionFailure::from_launch_error(&request.interpreter, e))
}

/// Kill the child and everything in its process group, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            kill_process_group(pid);
        }
    }

    if let Err(err) = child.kill().await {
        tracing::warn!(?pid, error = %err, "failed to kill child process");
    }
}

/// Join both reader tasks once the child has exited.
///
/// Descendants that inherited the pipes can keep them open after the child
/// itself is gone. After a grace period the process group is killed so the
/// readers see EOF; if something outside the group still holds the pipes,
/// the readers are told to stop and hand back what they have read so far.
async fn collect_output(
    pid: Option<u32>,
    stop: &watch::Sender<bool>,
    stdout_task: JoinHandle<Vec<u8>>,
    stderr_task: JoinHandle<Vec<u8>>,
) -> (Vec<u8>, Vec<u8>) {
    let drain = async move {
        let (stdout, stderr) = tokio::join!(stdout_task, stderr_task);
        (stdout.unwrap_or_default(), stderr.unwrap_or_default())
    };
    tokio::pin!(drain);

    if let Ok(output) = time::timeout(DRAIN_GRACE, &mut drain).await {
        return output;
    }

    tracing::warn!(?pid, "output pipes still open after exit, killing process group");
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            kill_process_group(pid);
        }
    }

    if let Ok(output) = time::timeout(DRAIN_GRACE, &mut drain).await {
        return output;
    }

    tracing::warn!(?pid, "output pipes held outside the process group, keeping partial output");
    stop.send_replace(true);
    drain.await
}

/// Send SIGKILL to the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };

    // SAFETY: killpg only delivers a signal; it touches no memory we own.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %err, "failed to kill process group");
        }
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes.
///
/// Bytes past the limit are still read so the child never blocks on a full
/// pipe. Once `stop` changes, the bytes read so far are returned.
async fn read_capped<R: AsyncRead + Unpin>(
    stream: Option<R>,
    limit: usize,
    mut stop: watch::Receiver<bool>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(mut stream) = stream else {
        return buf;
    };

    let mut chunk = [0u8; READ_BUFFER_SIZE];
    let mut truncated = false;
    loop {
        let read = tokio::select! {
            read = stream.read(&mut chunk) => read,
            _ = stop.changed() => break,
        };
        match read {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buf.len());
                if n > room {
                    truncated = true;
                }
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }

    if truncated {
        tracing::warn!(limit, "child output truncated");
    }
    buf
}

/// Exit code of a finished child; signal deaths map to the negated signal number.
///
/// SIGHUP is signal 1, so a child killed by it reports `-1` just like
/// [`SENTINEL_EXIT_CODE`]. Only `ExecutionResult::failure` tells the two apart.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    SENTINEL_EXIT_CODE
}
