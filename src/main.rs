//! script-runner binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use script_runner::api::{serve, AppState};
use script_runner::cli::{parse_args, print_help, print_version};
use script_runner::config::Config;
use script_runner::{logging, ScriptStore, TracingObserver};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run 'script-runner --help' for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if logging::try_init(Some(config.log_filter())).is_err() {
        eprintln!("warning: logging already initialized");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> script_runner::Result<()> {
    info!("script-runner v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.to_server_config()?;
    let store = ScriptStore::open(config.to_store_config()).await?;
    info!(dir = %store.dir().display(), "Script directory ready");

    let executor = config.build_executor(Arc::new(TracingObserver));
    info!(
        interpreter = %executor.interpreter().display(),
        timeout_secs = executor.timeout().as_secs(),
        "Executor configured"
    );

    serve(server_config, AppState::new(executor, store)).await
}
