//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "script_runner=info,tower_http=info";

/// Initialize the logging system.
///
/// `level` accepts either a bare level (`debug`) or a full filter directive
/// (`script_runner=debug,tower_http=warn`). Returns `Err` if logging has
/// already been initialized. Without a level, `RUST_LOG` is used, falling
/// back to [`DEFAULT_FILTER`].
pub fn try_init(level: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

/// Build the filter for the given level, falling back to the environment.
fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) if level.contains('=') => EnvFilter::new(level),
        Some(level) => EnvFilter::new(format!("script_runner={level},tower_http={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_idempotent() {
        // First call may or may not succeed depending on test order
        let _ = try_init(Some("debug"));
        let _ = try_init(None);
    }

    #[test]
    fn test_bare_level_is_scoped() {
        let filter = env_filter(Some("debug")).to_string();
        assert!(filter.contains("script_runner=debug"));
    }

    #[test]
    fn test_directive_passthrough() {
        let filter = env_filter(Some("script_runner=trace")).to_string();
        assert!(filter.contains("script_runner=trace"));
        assert!(!filter.contains("tower_http"));
    }

    #[test]
    fn test_logging_works() {
        let _ = try_init(None);

        tracing::info!("test info message");
        tracing::error!(path = "/tmp/x.py", "test error message");
    }
}
