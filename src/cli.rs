//! Command-line interface for script-runner.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Unset options leave the file/environment configuration untouched.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Interpreter binary scripts run under.
    pub interpreter: Option<String>,
    /// Execution timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Directory submitted scripts are written to.
    pub script_dir: Option<PathBuf>,
    /// Keep scripts on disk after they have run.
    pub retain_scripts: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('i') | Long("interpreter") => {
                result.interpreter = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("timeout", value.clone()))?;
                if secs == 0 {
                    return Err(ArgsError::InvalidValue("timeout", value));
                }
                result.timeout_secs = Some(secs);
            }
            Short('d') | Long("script-dir") => {
                result.script_dir = Some(parser.value()?.parse()?);
            }
            Long("retain-scripts") => {
                result.retain_scripts = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"script-runner {version}
HTTP service that saves submitted code and runs it under a bounded interpreter

USAGE:
    script-runner [OPTIONS]

OPTIONS:
    -H, --host <ADDR>         Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>         Port to listen on [default: 8000]
    -c, --config <FILE>       Path to configuration file (JSON)
    -i, --interpreter <BIN>   Interpreter scripts run under [default: python3]
    -t, --timeout <SECS>      Per-run timeout in seconds [default: 10]
    -d, --script-dir <DIR>    Directory submitted scripts are saved to [default: host_code]
        --retain-scripts      Keep scripts on disk after they have run
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    SCRIPT_RUNNER_HOST         Host address (overrides config)
    SCRIPT_RUNNER_PORT         Port number (overrides config)
    SCRIPT_RUNNER_INTERPRETER  Interpreter binary (overrides config)
    SCRIPT_RUNNER_TIMEOUT      Timeout in seconds (overrides config)
    SCRIPT_RUNNER_SCRIPT_DIR   Script directory (overrides config)
    SCRIPT_RUNNER_LOG_LEVEL    Log level (overrides config)
    RUST_LOG                   Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:8000, python3, 10s timeout)
    script-runner

    # Listen on all interfaces, shared code directory, 30s limit
    script-runner -H 0.0.0.0 -d /usr/src/app/host_code -t 30

    # Start with config file
    script-runner -c /etc/script-runner/config.json

SECURITY:
    Submitted code runs with the privileges of this process. Put the service
    behind an isolation layer (container, namespaces, seccomp) before exposing it.
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("script-runner {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
