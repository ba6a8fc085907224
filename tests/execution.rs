//! Execution core integration tests.
//!
//! Scripts are small `sh` programs written to temp files, so these tests only
//! need a POSIX shell.

#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use script_runner::execution::{
    ExecutionFailure, ExecutionObserver, ExecutionRequest, ExecutionResult, FailureKind,
    NoopObserver, ScriptExecutor,
};

/// Helper to create a temporary shell script from the given body.
fn write_script(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .unwrap();
    write!(f, "{body}").unwrap();
    f
}

fn executor() -> ScriptExecutor {
    ScriptExecutor::new("sh")
        .with_timeout(Duration::from_secs(10))
        .with_observer(Arc::new(NoopObserver))
}

/// Whether `pid` names a live (non-zombie) process.
#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => {
            // State is the first field after the parenthesised command name.
            let state = stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next());
            state != Some("Z")
        }
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
async fn wait_until_gone(pid: u32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !is_running(pid)
}

fn read_pid(path: &Path) -> u32 {
    std::fs::read_to_string(path).unwrap().trim().parse().unwrap()
}

// ============================================================================
// Normal completion
// ============================================================================

#[tokio::test]
async fn test_success_captures_streams_separately() {
    let script = write_script("echo out\necho err >&2\nexit 0\n");
    let executor = executor();

    let result = executor.run(&executor.request(script.path())).await;

    assert!(result.succeeded);
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert!(result.failure.is_none());
}

#[tokio::test]
async fn test_explicit_nonzero_exit() {
    let script = write_script("echo partial\necho broken >&2\nexit 7\n");
    let executor = executor();

    let result = executor.run(&executor.request(script.path())).await;

    assert!(!result.succeeded);
    assert_eq!(result.exit_code, 7);
    assert_eq!(result.stdout, "partial\n");
    assert_eq!(result.stderr, "broken\n");
    assert!(result.failure.is_none(), "a non-zero exit is not a failure kind");
}

#[tokio::test]
async fn test_large_output_is_not_deadlocked() {
    // Well past a pipe buffer on both streams.
    let script = write_script(
        "i=0\nwhile [ $i -lt 5000 ]; do echo line-$i; echo err-$i >&2; i=$((i+1)); done\n",
    );
    let executor = executor();

    let result = executor.run(&executor.request(script.path())).await;

    assert!(result.succeeded);
    assert_eq!(result.stdout.lines().count(), 5000);
    assert_eq!(result.stderr.lines().count(), 5000);
}

#[tokio::test]
async fn test_stdin_is_closed() {
    let script = write_script("cat\necho done\n");
    let executor = executor();

    let result = executor.run(&executor.request(script.path())).await;

    assert!(result.succeeded);
    assert_eq!(result.stdout, "done\n");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_output_kept_when_detached_descendant_holds_pipes() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    // The detached sleeper lives in its own session, out of reach of the group kill.
    let script = write_script(&format!(
        "echo hello\necho warn >&2\nsetsid sh -c 'echo $$ > {}; exec sleep 30' &\nexit 0\n",
        pid_file.display()
    ));
    let executor = executor();

    let started = Instant::now();
    let result = executor.run(&executor.request(script.path())).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.succeeded);
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.stderr, "warn\n");
    assert!(result.failure.is_none());

    let pid = read_pid(&pid_file);
    // SAFETY: sending a signal to a pid this test started.
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGKILL);
    }
}

// ============================================================================
// Timeout
// ============================================================================

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timeout_kills_process() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let script = write_script(&format!(
        "echo $$ > {}\necho before\nexec sleep 30\n",
        pid_file.display()
    ));
    let executor = executor();
    let request = executor
        .request(script.path())
        .timeout(Duration::from_millis(500));

    let started = Instant::now();
    let result = executor.run(&request).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.exit_code, -1);
    assert!(!result.succeeded);
    assert_eq!(result.stdout, "", "partial output is discarded on timeout");
    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert!(result.stderr.starts_with("TimeoutExpired"));
    assert!(result.stderr.contains("0.500 seconds"));

    // The child was reaped before run returned.
    let pid = read_pid(&pid_file);
    assert!(!is_running(pid), "process {pid} still running after timeout");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timeout_kills_descendants() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let script = write_script(&format!(
        "sleep 30 &\necho $! > {}\nwait\n",
        pid_file.display()
    ));
    let executor = executor();
    let request = executor
        .request(script.path())
        .timeout(Duration::from_millis(500));

    let result = executor.run(&request).await;

    assert_eq!(result.failure, Some(FailureKind::Timeout));
    let pid = read_pid(&pid_file);
    assert!(wait_until_gone(pid).await, "grandchild {pid} survived timeout");
}

// ============================================================================
// Launch failures
// ============================================================================

#[tokio::test]
async fn test_missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.sh");
    let executor = executor();

    let result = executor.run(&executor.request(&missing)).await;

    assert_eq!(result.exit_code, -1);
    assert!(!result.succeeded);
    assert_eq!(result.stdout, "");
    assert_eq!(result.failure, Some(FailureKind::NotFound));
    assert!(result.stderr.contains("File not found"));
    assert!(result.stderr.contains(&missing.display().to_string()));
}

#[tokio::test]
async fn test_missing_interpreter() {
    let script = write_script("echo hi\n");
    let executor = ScriptExecutor::new("definitely-not-an-interpreter-7f3a")
        .with_observer(Arc::new(NoopObserver));

    let result = executor.run(&executor.request(script.path())).await;

    assert_eq!(result.failure, Some(FailureKind::NotFound));
    assert!(result.stderr.contains("definitely-not-an-interpreter-7f3a"));
}

#[tokio::test]
async fn test_interpreter_without_execute_permission() {
    let script = write_script("echo hi\n");
    // Closed so the only obstacle to exec is the missing execute bit.
    let interpreter = write_script("#!/bin/sh\nexec sh \"$@\"\n").into_temp_path();
    std::fs::set_permissions(&interpreter, std::fs::Permissions::from_mode(0o644)).unwrap();

    let executor = ScriptExecutor::new(interpreter.to_path_buf()).with_observer(Arc::new(NoopObserver));
    let result = executor.run(&executor.request(script.path())).await;

    assert_eq!(result.exit_code, -1);
    assert!(!result.succeeded);
    assert_eq!(result.failure, Some(FailureKind::PermissionDenied));
    assert!(result.stderr.contains("Permission denied"));
    assert!(!result.stderr.contains("File not found"));
    assert!(result.stderr.contains(&interpreter.display().to_string()));
}

#[tokio::test]
async fn test_unreadable_script_is_permission_denied() {
    // Root reads files regardless of mode bits.
    // SAFETY: geteuid has no preconditions.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let script = write_script("echo hi\n").into_temp_path();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o000)).unwrap();
    let executor = executor();

    let result = executor.run(&executor.request(script.to_path_buf())).await;

    assert_eq!(result.exit_code, -1);
    assert!(!result.succeeded);
    assert_eq!(result.failure, Some(FailureKind::PermissionDenied));
    assert_eq!(result.stderr, format!("Permission denied: {}", script.display()));
}

// ============================================================================
// Concurrency & idempotence
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_isolated() {
    let executor = Arc::new(executor());
    let scripts: Vec<_> = (0..12)
        .map(|i| write_script(&format!("echo out-{i}\necho err-{i} >&2\nsleep 0.1\nexit {i}\n")))
        .collect();

    let handles: Vec<_> = scripts
        .iter()
        .map(|script| {
            let executor = Arc::clone(&executor);
            let request = executor.request(script.path());
            tokio::spawn(async move { executor.run(&request).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.stdout, format!("out-{i}\n"));
        assert_eq!(result.stderr, format!("err-{i}\n"));
        assert_eq!(result.exit_code, i as i32);
        assert_eq!(result.succeeded, i == 0);
    }
}

#[tokio::test]
async fn test_repeat_runs_agree() {
    let script = write_script("echo same\nexit 4\n");
    let executor = executor();
    let request = executor.request(script.path()).arg("x");

    let first = executor.run(&request).await;
    let second = executor.run(&request).await;

    assert_eq!(first.exit_code, second.exit_code);
    assert_eq!(first.succeeded, second.succeeded);
    assert_eq!(first.stdout, second.stdout);
}

// ============================================================================
// Observation
// ============================================================================

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn launched(&self, request: &ExecutionRequest) {
        self.events
            .lock()
            .unwrap()
            .push(format!("launched {}", request.script.display()));
    }

    fn completed(&self, _request: &ExecutionRequest, result: &ExecutionResult) {
        self.events
            .lock()
            .unwrap()
            .push(format!("completed {}", result.exit_code));
    }

    fn failed(&self, _request: &ExecutionRequest, failure: &ExecutionFailure) {
        self.events
            .lock()
            .unwrap()
            .push(format!("failed {}", failure.kind()));
    }
}

#[tokio::test]
async fn test_observer_sees_launch_then_completion() {
    let script = write_script("exit 2\n");
    let observer = Arc::new(RecordingObserver::default());
    let executor = ScriptExecutor::new("sh").with_observer(observer.clone());

    executor.run(&executor.request(script.path())).await;

    assert_eq!(
        observer.events(),
        vec![
            format!("launched {}", script.path().display()),
            "completed 2".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_observer_sees_launch_then_failure() {
    let dir = tempfile::tempdir().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let executor = ScriptExecutor::new("sh").with_observer(observer.clone());

    let result = executor
        .run(&executor.request(dir.path().join("missing.sh")))
        .await;

    assert_eq!(result.failure, Some(FailureKind::NotFound));
    let events = observer.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].starts_with("launched"));
    assert_eq!(events[1], "failed not_found");
}
