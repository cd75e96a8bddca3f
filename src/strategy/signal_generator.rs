//! Signal Generator
//!
//! Pure mapping from a statistics snapshot and the current price to a
//! [`Signal`]. Two policies, picked once per run:
//!
//! Mean reversion band:
//! - BUY  when price < mean - std_dev
//! - SELL when price > mean + std_dev, risk-managed runs only
//! - HOLD otherwise, or when mean / std_dev are undefined
//!
//! Tail moment:
//! - BUY  when z < -2, skew < 0, kurtosis > 3
//! - SELL when z >  2, skew > 0, kurtosis > 3
//! - HOLD otherwise
//!
//! The tail-moment policy reads undefined z / skew / kurtosis as 0 unless
//! `strict_moments` is set. Reading them as 0 can hide missing data: with no
//! moments yet the rule silently holds rather than reporting a gap.

use crate::domain::{Signal, StatisticsSnapshot};
use crate::strategy::params::{SignalPolicy, StrategyConfig};

pub const TAIL_Z_THRESHOLD: f64 = 2.0;
pub const TAIL_KURTOSIS_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalGenerator {
    policy: SignalPolicy,
    /// SELL from the band policy only when a risk budget is configured
    risk_managed: bool,
    strict_moments: bool,
}

impl SignalGenerator {
    pub fn new(policy: SignalPolicy, risk_managed: bool) -> Self {
        Self {
            policy,
            risk_managed,
            strict_moments: false,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            policy: config.signal_policy,
            risk_managed: config.risk.sizing.is_risk_managed(),
            strict_moments: config.strict_moments,
        }
    }

    pub fn with_strict_moments(mut self, strict: bool) -> Self {
        self.strict_moments = strict;
        self
    }

    pub fn policy(&self) -> SignalPolicy {
        self.policy
    }

    pub fn evaluate(&self, snapshot: &StatisticsSnapshot, price: f64) -> Signal {
        match self.policy {
            SignalPolicy::MeanReversion => mean_reversion(snapshot, price, self.risk_managed),
            SignalPolicy::TailMoment => tail_moment(snapshot, self.strict_moments),
        }
    }
}

pub fn mean_reversion(snapshot: &StatisticsSnapshot, price: f64, risk_managed: bool) -> Signal {
    let (Some(mean), Some(std_dev)) = (snapshot.mean, snapshot.std_dev) else {
        return Signal::Hold;
    };

    if price < mean - std_dev {
        Signal::Buy
    } else if price > mean + std_dev && risk_managed {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn tail_moment(snapshot: &StatisticsSnapshot, strict: bool) -> Signal {
    let (z, skew, kurt) = if strict {
        match (snapshot.zscore, snapshot.skewness, snapshot.kurtosis) {
            (Some(z), Some(s), Some(k)) => (z, s, k),
            _ => return Signal::Hold,
        }
    } else {
        (
            snapshot.zscore.unwrap_or(0.0),
            snapshot.skewness.unwrap_or(0.0),
            snapshot.kurtosis.unwrap_or(0.0),
        )
    };

    if z < -TAIL_Z_THRESHOLD && skew < 0.0 && kurt > TAIL_KURTOSIS_THRESHOLD {
        Signal::Buy
    } else if z > TAIL_Z_THRESHOLD && skew > 0.0 && kurt > TAIL_KURTOSIS_THRESHOLD {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
