//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching
//! config/example.toml. Every section and key has a default, so a partial
//! file only needs to name what it changes.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::pi42::Pi42Config;
use crate::application::LoopSettings;
use crate::domain::SizingMode;
use crate::ports::OrderType;
use crate::strategy::{RiskConfig, SignalPolicy, StrategyConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: StrategySection,
    pub risk: RiskSection,
    pub feed: FeedSection,
    pub execution: ExecutionSection,
    pub records: RecordsSection,
    pub logging: LoggingSection,
}

/// Strategy configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    /// Prices in the mean / std-dev window
    pub window_level: usize,
    /// Log-returns in the skewness / kurtosis window
    pub window_moment: usize,
    /// "mean_reversion" or "tail_moment"
    pub signal_policy: SignalPolicy,
    /// Tail-moment only: HOLD on undefined inputs instead of reading them as 0
    pub strict_moments: bool,
    /// Skip ticks until the level window is full
    pub require_full_window: bool,
    /// Stop on a bad observation instead of skipping it
    pub abort_on_invalid_observation: bool,
}

impl Default for StrategySection {
    fn default() -> Self {
        let defaults = StrategyConfig::default();
        Self {
            window_level: defaults.window_level,
            window_moment: defaults.window_moment,
            signal_policy: defaults.signal_policy,
            strict_moments: defaults.strict_moments,
            require_full_window: defaults.require_full_window,
            abort_on_invalid_observation: defaults.abort_on_invalid_observation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingModeName {
    FixedAmount,
    FractionOfBalance,
}

/// Risk management configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub sizing_mode: SizingModeName,
    /// Currency per entry for `fixed_amount`, fraction in (0, 1] otherwise
    pub risk_budget: f64,
    /// Starting simulated balance
    pub initial_balance: f64,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            sizing_mode: SizingModeName::FixedAmount,
            risk_budget: 30.0,
            initial_balance: 1_000_000.0,
        }
    }
}

impl RiskSection {
    pub fn sizing(&self) -> SizingMode {
        match self.sizing_mode {
            SizingModeName::FixedAmount => SizingMode::FixedAmount {
                amount: self.risk_budget,
            },
            SizingModeName::FractionOfBalance => SizingMode::FractionOfBalance {
                fraction: self.risk_budget,
            },
        }
    }
}

/// Price feed configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// Public market data host
    pub base_url: String,
    pub symbol: String,
    /// Candle interval, e.g. "1m", "1h"
    pub interval: String,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    /// Candles downloaded for a backtest without a CSV
    pub history_limit: usize,
    /// Give up after this many failed polls in a row. Unset retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.pi42.com".to_string(),
            symbol: "ETHINR".to_string(),
            interval: "1m".to_string(),
            poll_interval_seconds: 60,
            request_timeout_seconds: 10,
            history_limit: 6000,
            max_consecutive_failures: None,
        }
    }
}

impl FeedSection {
    /// Market host with `PI42_MARKET_URL` env override
    pub fn get_base_url(&self) -> String {
        std::env::var("PI42_MARKET_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Order execution configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Private trading host
    pub base_url: String,
    pub margin_asset: String,
    pub order_type: OrderType,
    /// Acknowledge orders locally instead of sending them
    pub paper: bool,
    /// Paper mode only: probability that a call fails
    pub paper_failure_rate: f64,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.pi42.com".to_string(),
            margin_asset: "INR".to_string(),
            order_type: OrderType::Market,
            paper: true,
            paper_failure_rate: 0.0,
        }
    }
}

impl ExecutionSection {
    /// Trading host with `PI42_TRADING_URL` env override
    pub fn get_base_url(&self) -> String {
        std::env::var("PI42_TRADING_URL").unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Trade record output section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordsSection {
    /// CSV decision log, `~` expanded
    pub path: String,
}

impl Default for RecordsSection {
    fn default() -> Self {
        Self {
            path: "trading_signals.csv".to_string(),
        }
    }
}

impl RecordsSection {
    pub fn resolved_path(&self) -> PathBuf {
        expand_path(&self.path)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file (in addition to stdout)
    pub log_to_file: bool,
    /// Log file path
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: "logs/maxwell.log".to_string(),
        }
    }
}

impl LoggingSection {
    pub fn resolved_log_file(&self) -> PathBuf {
        expand_path(&self.log_file)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        StrategyConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        // Validate feed
        if self.feed.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "feed.base_url cannot be empty".to_string(),
            ));
        }
        if self.feed.symbol.is_empty() {
            return Err(ConfigError::ValidationError(
                "feed.symbol cannot be empty".to_string(),
            ));
        }
        if self.feed.interval.is_empty() {
            return Err(ConfigError::ValidationError(
                "feed.interval cannot be empty".to_string(),
            ));
        }
        if self.feed.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_seconds must be > 0".to_string(),
            ));
        }
        if self.feed.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_seconds must be > 0".to_string(),
            ));
        }
        if self.feed.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be > 0".to_string(),
            ));
        }
        if self.feed.max_consecutive_failures == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_consecutive_failures must be > 0 when set".to_string(),
            ));
        }

        // Validate execution
        if self.execution.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "execution.base_url cannot be empty".to_string(),
            ));
        }
        if self.execution.margin_asset.is_empty() {
            return Err(ConfigError::ValidationError(
                "margin_asset cannot be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.execution.paper_failure_rate) {
            return Err(ConfigError::ValidationError(format!(
                "paper_failure_rate must be 0-1, got {}",
                self.execution.paper_failure_rate
            )));
        }
        // Orders carry no limit or stop price
        if self.execution.order_type != OrderType::Market {
            return Err(ConfigError::ValidationError(format!(
                "order_type {} needs a price; only MARKET is supported",
                self.execution.order_type
            )));
        }

        if self.records.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "records.path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            symbol: self.feed.symbol.clone(),
            margin_asset: self.execution.margin_asset.clone(),
            order_type: self.execution.order_type,
            poll_interval: Duration::from_secs(self.feed.poll_interval_seconds),
            fetch_timeout: Duration::from_secs(self.feed.request_timeout_seconds),
            max_consecutive_failures: self.feed.max_consecutive_failures,
        }
    }

    pub fn pi42_config(&self) -> Pi42Config {
        Pi42Config {
            market_url: self.feed.get_base_url(),
            trading_url: self.execution.get_base_url(),
            timeout: Duration::from_secs(self.feed.request_timeout_seconds),
        }
    }
}

// Conversion from Config to StrategyConfig
impl From<&Config> for StrategyConfig {
    fn from(config: &Config) -> Self {
        StrategyConfig {
            window_level: config.strategy.window_level,
            window_moment: config.strategy.window_moment,
            signal_policy: config.strategy.signal_policy,
            strict_moments: config.strategy.strict_moments,
            require_full_window: config.strategy.require_full_window,
            abort_on_invalid_observation: config.strategy.abort_on_invalid_observation,
            risk: RiskConfig {
                sizing: config.risk.sizing(),
                initial_balance: config.risk.initial_balance,
            },
        }
    }
}
