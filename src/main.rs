//! Maxwell - Rolling-Moment Mean Reversion Trading Bot
//!
//! Live polling, backtests and history downloads for Pi42 futures.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use maxwell_bot::adapters::cli;
use maxwell_bot::config::{load_config, LoggingSection};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in the TOML)
    dotenvy::dotenv().ok();

    let app = cli::init();

    let config_path = app.command.config_path().to_path_buf();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    // Held until exit so buffered file logs are flushed
    let _guard = init_logging(app.verbose, app.debug, &config.logging)?;

    cli::execute(app.command, config).await
}

/// `RUST_LOG` wins, then `--debug` / `--verbose`, then `[logging] level`
fn init_logging(verbose: bool, debug: bool, logging: &LoggingSection) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(&logging.level)
        }
    });

    let stdout_layer = fmt::layer().with_target(false);

    if !logging.log_to_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
        return Ok(None);
    }

    let log_file = logging.resolved_log_file();
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let file_name = log_file
        .file_name()
        .context("log_file must name a file")?;

    std::fs::create_dir_all(&directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let file_appender = tracing_appender::rolling::daily(&directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}
