//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Maxwell trading bot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::adapters::execution::PaperExecution;
use crate::adapters::market_data::history::{fetch_history, to_observations, write_klines_csv};
use crate::adapters::market_data::{load_csv, Pi42KlineFeed, ReplayFeed};
use crate::adapters::pi42::{Credentials, Pi42Client, Pi42OrderClient};
use crate::adapters::records::{CsvRecordSink, MemorySink};
use crate::application::{BacktestSummary, LoopSettings, StrategyLoop};
use crate::config::Config;
use crate::ports::{ExecutionPort, PriceFeed, RecordSink};
use crate::strategy::{SignalPolicy, StrategyConfig};

/// Maxwell - rolling-moment mean reversion bot for Pi42 futures
#[derive(Parser, Debug)]
#[command(
    name = "maxwell-bot",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Rolling-moment mean reversion bot for Pi42 futures",
    long_about = "Maxwell tracks rolling mean, standard deviation, skewness and kurtosis \
                  of closing prices and trades a single risk-budgeted long position."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the live trading loop
    Run(RunCmd),

    /// Replay historical closes through the strategy
    Backtest(BacktestCmd),

    /// Download klines to an OHLCV CSV file
    Fetch(FetchCmd),
}

impl Command {
    /// Configuration file named by the subcommand
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Backtest(cmd) => &cmd.config,
            Command::Fetch(cmd) => &cmd.config,
        }
    }
}

/// Start trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,

    /// Run in paper trading mode (no real orders)
    #[arg(short, long)]
    pub paper: bool,

    /// Override the trade record CSV path
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,
}

/// Run backtesting
#[derive(Parser, Debug)]
pub struct BacktestCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,

    /// OHLCV CSV to replay. Without it, recent klines are downloaded.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Override starting capital
    #[arg(long, value_name = "AMOUNT")]
    pub capital: Option<f64>,

    /// Override signal policy (mean_reversion, tail_moment)
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<SignalPolicy>,

    /// Override level window length
    #[arg(short, long, value_name = "PERIODS")]
    pub window: Option<usize>,

    /// Write trade records to CSV
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Download historical klines
#[derive(Parser, Debug)]
pub struct FetchCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/example.toml")]
    pub config: PathBuf,

    /// Output CSV file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Number of candles (defaults to feed.history_limit)
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Execute the CLI command
pub async fn execute(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Backtest(cmd) => backtest_command(cmd, config).await,
        Command::Fetch(cmd) => fetch_command(cmd, config).await,
    }
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Starting Maxwell trading bot...");
    tracing::info!("Config: {}", cmd.config.display());

    let strategy = StrategyConfig::from(&config);
    let settings = config.loop_settings();
    let records = cmd
        .records
        .clone()
        .unwrap_or_else(|| config.records.resolved_path());
    let sink = CsvRecordSink::new(records);

    let client = Pi42Client::new(config.pi42_config()).context("Failed to create Pi42 client")?;
    let mut feed = Pi42KlineFeed::new(
        client,
        config.feed.symbol.clone(),
        config.feed.interval.clone(),
        strategy.window_level,
    );

    if cmd.paper || config.execution.paper {
        tracing::warn!("PAPER TRADING MODE - no real orders");
        let execution = PaperExecution::with_failure_rate(config.execution.paper_failure_rate);
        run_live(strategy, settings, execution, sink, &mut feed).await
    } else {
        let credentials = Credentials::from_env()
            .context("Live trading needs PI42_API_KEY and PI42_API_SECRET (use --paper otherwise)")?;
        let execution = Pi42OrderClient::new(config.pi42_config(), credentials)
            .context("Failed to create Pi42 order client")?;
        tracing::warn!("LIVE TRADING MODE - orders go to {}", config.execution.get_base_url());
        run_live(strategy, settings, execution, sink, &mut feed).await
    }
}

async fn run_live<E, S, F>(
    strategy: StrategyConfig,
    settings: LoopSettings,
    execution: E,
    sink: S,
    feed: &mut F,
) -> Result<()>
where
    E: ExecutionPort,
    S: RecordSink,
    F: PriceFeed,
{
    let mut strategy_loop = StrategyLoop::new(strategy, settings, execution, sink)
        .context("Failed to create strategy loop")?;

    // Setup Ctrl+C handler
    let handle = strategy_loop.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop();
    });

    strategy_loop.run_live(feed).await?;

    let status = strategy_loop.status();
    tracing::info!(
        "Stopped with balance {:.4}, position {:.6}, {} divergences",
        status.portfolio.balance(),
        status.portfolio.position(),
        status.counters.divergences
    );
    println!("{}", strategy_loop.summary());
    Ok(())
}

/// Handle backtest command
async fn backtest_command(cmd: BacktestCmd, config: Config) -> Result<()> {
    let mut strategy = StrategyConfig::from(&config);
    if let Some(capital) = cmd.capital {
        strategy.risk.initial_balance = capital;
    }
    if let Some(policy) = cmd.policy {
        strategy.signal_policy = policy;
    }
    if let Some(window) = cmd.window {
        strategy.window_level = window;
    }

    let observations = match &cmd.csv {
        Some(path) => load_csv(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let client = Pi42Client::new(config.pi42_config()).context("Failed to create Pi42 client")?;
            let klines = fetch_history(
                &client,
                &config.feed.symbol,
                &config.feed.interval,
                config.feed.history_limit,
            )
            .await
            .context("Failed to download history")?;
            to_observations(&klines)?
        }
    };

    tracing::info!(
        "Backtesting {} observations - policy: {:?}, capital: {}",
        observations.len(),
        strategy.signal_policy,
        strategy.risk.initial_balance
    );

    let feed = ReplayFeed::new(observations);
    let settings = config.loop_settings();
    let summary = match &cmd.records {
        Some(path) => replay(strategy, settings, CsvRecordSink::new(path), feed).await?,
        None => replay(strategy, settings, MemorySink::new(), feed).await?,
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

/// Replay against paper execution. Backtests never reach the broker.
async fn replay<S: RecordSink>(
    strategy: StrategyConfig,
    settings: LoopSettings,
    sink: S,
    mut feed: ReplayFeed,
) -> Result<BacktestSummary> {
    let mut strategy_loop = StrategyLoop::new(strategy, settings, PaperExecution::new(), sink)
        .context("Invalid strategy parameters")?;
    strategy_loop.run_replay(&mut feed).await?;
    Ok(strategy_loop.summary())
}

/// Handle fetch command
async fn fetch_command(cmd: FetchCmd, config: Config) -> Result<()> {
    let limit = cmd.limit.unwrap_or(config.feed.history_limit);
    let client = Pi42Client::new(config.pi42_config()).context("Failed to create Pi42 client")?;

    let klines = fetch_history(&client, &config.feed.symbol, &config.feed.interval, limit)
        .await
        .context("Failed to download klines")?;
    write_klines_csv(&cmd.output, &klines)
        .with_context(|| format!("Failed to write {}", cmd.output.display()))?;

    println!(
        "Saved {} {} {} candles to {}",
        klines.len(),
        config.feed.symbol,
        config.feed.interval,
        cmd.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["maxwell-bot", "run", "--config", "test.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("test.toml"));
                assert!(!cmd.paper);
                assert!(cmd.records.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_paper() {
        let app = CliApp::try_parse_from(vec!["maxwell-bot", "run", "--paper"]).unwrap();
        match app.command {
            Command::Run(cmd) => {
                assert!(cmd.paper);
                assert_eq!(cmd.config, PathBuf::from("config/example.toml"));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_backtest_overrides() {
        let args = vec![
            "maxwell-bot", "backtest", "--csv", "btc.csv", "--capital", "5000",
            "--policy", "tail_moment", "--window", "48", "--json",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Backtest(cmd) => {
                assert_eq!(cmd.csv, Some(PathBuf::from("btc.csv")));
                assert_eq!(cmd.capital, Some(5000.0));
                assert_eq!(cmd.policy, Some(SignalPolicy::TailMoment));
                assert_eq!(cmd.window, Some(48));
                assert!(cmd.json);
            }
            _ => panic!("Expected Backtest command"),
        }
    }

    #[test]
    fn test_cli_app_rejects_unknown_policy() {
        let args = vec!["maxwell-bot", "backtest", "--policy", "momentum"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_fetch() {
        let args = vec!["maxwell-bot", "-v", "fetch", "-o", "out.csv", "--limit", "100"];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(app.verbose);
        match &app.command {
            Command::Fetch(cmd) => {
                assert_eq!(cmd.output, PathBuf::from("out.csv"));
                assert_eq!(cmd.limit, Some(100));
            }
            _ => panic!("Expected Fetch command"),
        }
        assert_eq!(app.command.config_path(), Path::new("config/example.toml"));
    }

    #[test]
    fn test_fetch_requires_output() {
        assert!(CliApp::try_parse_from(vec!["maxwell-bot", "fetch"]).is_err());
    }

    #[tokio::test]
    async fn test_backtest_command_from_csv() {
        let mut csv = NamedTempFile::new().unwrap();
        writeln!(csv, "Timestamp,Open,High,Low,Close,Volume").unwrap();
        for hour in 0..23 {
            writeln!(csv, "2024-01-01 {:02}:00:00,100,100,100,100,1", hour).unwrap();
        }
        writeln!(csv, "2024-01-01 23:00:00,100,100,80,80,1").unwrap();

        let dir = tempdir().unwrap();
        let records = dir.path().join("records.csv");
        let cmd = BacktestCmd {
            config: PathBuf::from("unused.toml"),
            csv: Some(csv.path().to_path_buf()),
            capital: Some(1000.0),
            policy: None,
            window: None,
            records: Some(records.clone()),
            json: false,
        };

        backtest_command(cmd, Config::default()).await.unwrap();

        let written = std::fs::read_to_string(records).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains(",buy,entered,"));
    }
}
