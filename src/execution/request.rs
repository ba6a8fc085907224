//! Execution request building and representation.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single script run: interpreter, script, arguments and a wall-clock bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Executable used to run the script (e.g. `python3`).
    pub interpreter: PathBuf,
    /// Script passed as the interpreter's first argument.
    pub script: PathBuf,
    /// Extra arguments appended after the script path.
    pub args: Vec<String>,
    /// Maximum execution time.
    pub timeout: Duration,
}

impl ExecutionRequest {
    /// Create a request with no arguments and the default timeout.
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Arguments handed to the interpreter: `[script, args...]`.
    pub fn interpreter_args(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.script.clone().into_os_string());
        argv.extend(self.args.iter().map(OsString::from));
        argv
    }
}

impl fmt::Display for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interpreter.display(), self.script.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new() {
        let req = ExecutionRequest::new("python3", "/tmp/a.py");
        assert_eq!(req.interpreter, PathBuf::from("python3"));
        assert_eq!(req.script, PathBuf::from("/tmp/a.py"));
        assert!(req.args.is_empty());
        assert_eq!(req.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_request_builder_chain() {
        let req = ExecutionRequest::new("sh", "run.sh")
            .arg("--fast")
            .args(["a", "b"])
            .timeout(Duration::from_secs(3));

        assert_eq!(req.args, vec!["--fast", "a", "b"]);
        assert_eq!(req.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_interpreter_args_order() {
        let req = ExecutionRequest::new("sh", "run.sh").args(["x", "y"]);
        let argv: Vec<_> = req
            .interpreter_args()
            .into_iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        assert_eq!(argv, vec!["run.sh", "x", "y"]);
    }

    #[test]
    fn test_display() {
        let req = ExecutionRequest::new("python3", "/srv/s.py").arg("1");
        assert_eq!(req.to_string(), "python3 /srv/s.py 1");
    }
}
