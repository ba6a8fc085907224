//! Configuration management for script-runner.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::execution::{
    ExecutionObserver, ScriptExecutor, DEFAULT_INTERPRETER, DEFAULT_MAX_OUTPUT_BYTES,
};
use crate::storage::{StoreConfig, DEFAULT_EXTENSION, DEFAULT_SCRIPT_DIR};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Script execution configuration.
    pub executor: ExecutorSection,
    /// Script storage configuration.
    pub storage: StorageSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            graceful_shutdown: true,
        }
    }
}

/// Script execution section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Interpreter binary every script runs under.
    pub interpreter: String,
    /// Wall-clock limit per run, in seconds. Must be positive.
    pub timeout_secs: u64,
    /// Per-stream capture limit in bytes.
    pub max_output_bytes: usize,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout_secs: 10,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Script storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory submitted scripts are written to.
    pub script_dir: PathBuf,
    /// File extension for submitted scripts.
    pub extension: String,
    /// Keep scripts on disk after they have run.
    pub retain_scripts: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            retain_scripts: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SCRIPT_RUNNER_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("SCRIPT_RUNNER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(interpreter) = var("SCRIPT_RUNNER_INTERPRETER") {
            self.executor.interpreter = interpreter;
        }

        if let Some(secs) = var("SCRIPT_RUNNER_TIMEOUT").and_then(|t| t.parse().ok()) {
            self.executor.timeout_secs = secs;
        }

        if let Some(dir) = var("SCRIPT_RUNNER_SCRIPT_DIR") {
            self.storage.script_dir = PathBuf::from(dir);
        }

        if let Some(level) = var("SCRIPT_RUNNER_LOG_LEVEL").or_else(|| var("RUST_LOG")) {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref interpreter) = args.interpreter {
            self.executor.interpreter = interpreter.clone();
        }

        if let Some(secs) = args.timeout_secs {
            self.executor.timeout_secs = secs;
        }

        if let Some(ref dir) = args.script_dir {
            self.storage.script_dir = dir.clone();
        }

        if args.retain_scripts {
            self.storage.retain_scripts = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.executor.timeout_secs));
        }
        if self.executor.interpreter.trim().is_empty() {
            return Err(ConfigError::EmptyInterpreter);
        }
        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Storage settings for the script store.
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            dir: self.storage.script_dir.clone(),
            extension: self.storage.extension.clone(),
            retain: self.storage.retain_scripts,
        }
    }

    /// Configured execution timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.executor.timeout_secs)
    }

    /// Build the executor described by the executor section.
    pub fn build_executor(&self, observer: Arc<dyn ExecutionObserver>) -> ScriptExecutor {
        ScriptExecutor::new(&self.executor.interpreter)
            .with_timeout(self.timeout())
            .with_max_output_bytes(self.executor.max_output_bytes)
            .with_observer(observer)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Timeout must be a positive number of seconds.
    InvalidTimeout(u64),
    /// Interpreter must be set.
    EmptyInterpreter,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidTimeout(secs) => {
                write!(f, "timeout must be a positive number of seconds, got {}", secs)
            }
            Self::EmptyInterpreter => write!(f, "interpreter must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::RunnerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
