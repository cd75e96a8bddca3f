//! Strategy Parameters
//!
//! Configuration structs for the rolling statistics, signal policy and
//! position sizing. Defaults reproduce the hourly live bot: 24-candle level
//! window, 20-return moment window, mean reversion band, fixed 30 INR entries.

use serde::{Deserialize, Serialize};

use crate::domain::SizingMode;

/// Which rule turns a statistics snapshot into a signal. Picked once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolicy {
    /// Price outside the `mean ± std_dev` band
    MeanReversion,
    /// Extreme z-score confirmed by skewness and kurtosis
    TailMoment,
}

impl std::str::FromStr for SignalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean_reversion" | "mean-reversion" => Ok(SignalPolicy::MeanReversion),
            "tail_moment" | "tail-moment" => Ok(SignalPolicy::TailMoment),
            other => Err(format!("unknown signal policy: {}", other)),
        }
    }
}

/// Main strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Prices kept for mean / std-dev / z-score
    pub window_level: usize,
    /// Log-returns kept for skewness / kurtosis
    pub window_moment: usize,
    pub signal_policy: SignalPolicy,
    /// Tail-moment only: treat undefined inputs as HOLD instead of 0
    pub strict_moments: bool,
    /// Skip ticks until the level window is full
    pub require_full_window: bool,
    /// Stop the stream on a bad price instead of skipping it
    pub abort_on_invalid_observation: bool,
    pub risk: RiskConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            window_level: 24,
            window_moment: 20,
            signal_policy: SignalPolicy::MeanReversion,
            strict_moments: false,
            require_full_window: true,
            abort_on_invalid_observation: false,
            risk: RiskConfig::default(),
        }
    }
}

impl StrategyConfig {
    pub fn with_policy(mut self, policy: SignalPolicy) -> Self {
        self.signal_policy = policy;
        self
    }

    pub fn with_windows(mut self, level: usize, moment: usize) -> Self {
        self.window_level = level;
        self.window_moment = moment;
        self
    }

    pub fn with_sizing(mut self, sizing: SizingMode) -> Self {
        self.risk.sizing = sizing;
        self
    }

    pub fn with_initial_balance(mut self, balance: f64) -> Self {
        self.risk.initial_balance = balance;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_level == 0 {
            return Err(ConfigError::InvalidWindow("window_level", self.window_level));
        }
        if self.window_moment == 0 {
            return Err(ConfigError::InvalidWindow("window_moment", self.window_moment));
        }
        self.risk.validate()
    }
}

/// Position sizing and capital
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub sizing: SizingMode,
    pub initial_balance: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            sizing: SizingMode::FixedAmount { amount: 30.0 },
            initial_balance: 1_000_000.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(ConfigError::InvalidBalance(self.initial_balance));
        }
        match self.sizing {
            SizingMode::FixedAmount { amount } => {
                if !amount.is_finite() || amount <= 0.0 {
                    return Err(ConfigError::InvalidRiskBudget(amount));
                }
            }
            SizingMode::FractionOfBalance { fraction } => {
                if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
                    return Err(ConfigError::InvalidFraction(fraction));
                }
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {0}: {1} (must be > 0)")]
    InvalidWindow(&'static str, usize),
    #[error("Invalid initial balance: {0} (must be > 0)")]
    InvalidBalance(f64),
    #[error("Invalid risk budget: {0} (must be > 0)")]
    InvalidRiskBudget(f64),
    #[error("Invalid balance fraction: {0} (must be 0 < f <= 1)")]
    InvalidFraction(f64),
}
