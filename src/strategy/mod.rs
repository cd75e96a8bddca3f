//! Strategy Layer - Rolling moments and signal policies
//!
//! - `rolling_stats`: bounded-window mean, std-dev, z-score, skewness, kurtosis
//! - `signal_generator`: snapshot -> BUY / SELL / HOLD
//! - `params`: strategy, sizing and window configuration

pub mod params;
pub mod rolling_stats;
pub mod signal_generator;

pub use params::{ConfigError, RiskConfig, SignalPolicy, StrategyConfig};
pub use rolling_stats::{RollingStatistics, StatsError};
pub use signal_generator::SignalGenerator;
