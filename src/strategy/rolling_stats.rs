//! Rolling Statistics
//!
//! Bounded-window descriptors of recent price behaviour, recomputed on every
//! observation:
//!
//! - level window (`window_level` prices): mean, sample std-dev, z-score
//! - moment window (`window_moment` log-returns): skewness, excess kurtosis
//!
//! mean   = Σp / n
//! std    = sqrt(Σ(p - mean)² / (n - 1))
//! z      = (p_last - mean) / std
//! skew   = m3 / m2^1.5            (mk = Σ(r - r̄)^k / n)
//! kurt   = m4 / m2² - 3
//!
//! All sums run oldest to newest so identical inputs give identical bits.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{PriceObservation, StatisticsSnapshot};
use crate::strategy::params::StrategyConfig;

/// Fewest samples each statistic needs
pub const MIN_MEAN_SAMPLES: usize = 1;
pub const MIN_STD_SAMPLES: usize = 2;
pub const MIN_SKEW_RETURNS: usize = 3;
pub const MIN_KURT_RETURNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("Invalid observation: price {0} must be finite and positive")]
    InvalidObservation(f64),
    #[error("Out-of-order observation: {got} is before {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct RollingStatistics {
    window_level: usize,
    window_moment: usize,
    prices: VecDeque<f64>,
    returns: VecDeque<f64>,
    last_price: Option<f64>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl RollingStatistics {
    pub fn new(window_level: usize, window_moment: usize) -> Self {
        Self {
            window_level,
            window_moment,
            prices: VecDeque::with_capacity(window_level + 1),
            returns: VecDeque::with_capacity(window_moment + 1),
            last_price: None,
            last_timestamp: None,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.window_level, config.window_moment)
    }

    /// Append a price and return the fresh snapshot.
    ///
    /// A non-finite or non-positive price is rejected and the windows are
    /// left exactly as they were.
    pub fn update(&mut self, price: f64) -> Result<StatisticsSnapshot, StatsError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(StatsError::InvalidObservation(price));
        }

        if let Some(prev) = self.last_price {
            self.returns.push_back(price.ln() - prev.ln());
            if self.returns.len() > self.window_moment {
                self.returns.pop_front();
            }
        }

        self.prices.push_back(price);
        if self.prices.len() > self.window_level {
            self.prices.pop_front();
        }
        self.last_price = Some(price);

        Ok(self.snapshot())
    }

    /// Timestamped update. Rejects observations older than the last accepted one.
    pub fn observe(&mut self, observation: &PriceObservation) -> Result<StatisticsSnapshot, StatsError> {
        if let Some(last) = self.last_timestamp {
            if observation.timestamp < last {
                return Err(StatsError::OutOfOrder {
                    last,
                    got: observation.timestamp,
                });
            }
        }

        let snapshot = self.update(observation.price)?;
        self.last_timestamp = Some(observation.timestamp);
        Ok(snapshot)
    }

    /// Statistics over the current windows
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mean = mean(self.prices.iter().copied());
        let std_dev = mean.and_then(|m| sample_std(self.prices.iter().copied(), m));

        let zscore = match (self.last_price, mean, std_dev) {
            (Some(price), Some(m), Some(s)) if s > 0.0 => {
                let z = (price - m) / s;
                z.is_finite().then_some(z)
            }
            _ => None,
        };

        let (skewness, kurtosis) = self.moments();

        StatisticsSnapshot {
            mean,
            std_dev,
            zscore,
            skewness,
            kurtosis,
        }
    }

    fn moments(&self) -> (Option<f64>, Option<f64>) {
        let n = self.returns.len();
        if n < MIN_SKEW_RETURNS {
            return (None, None);
        }

        let Some(r_mean) = mean(self.returns.iter().copied()) else {
            return (None, None);
        };

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &r in &self.returns {
            let d = r - r_mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        let n = n as f64;
        m2 /= n;
        m3 /= n;
        m4 /= n;

        if m2 <= 0.0 {
            return (None, None);
        }

        let skew = finite(m3 / m2.powf(1.5));
        let kurt = if self.returns.len() >= MIN_KURT_RETURNS {
            finite(m4 / (m2 * m2) - 3.0)
        } else {
            None
        };

        (skew, kurt)
    }

    /// Level window is full
    pub fn is_warm(&self) -> bool {
        self.prices.len() >= self.window_level
    }

    /// Prices currently in the level window
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Returns currently in the moment window
    pub fn return_len(&self) -> usize {
        self.returns.len()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn reset(&mut self) {
        self.prices.clear();
        self.returns.clear();
        self.last_price = None;
        self.last_timestamp = None;
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count >= MIN_MEAN_SAMPLES).then(|| sum / count as f64)
}

fn sample_std(values: impl Iterator<Item = f64>, mean: f64) -> Option<f64> {
    let (ss, count) = values.fold((0.0, 0usize), |(s, c), v| {
        let d = v - mean;
        (s + d * d, c + 1)
    });
    if count < MIN_STD_SAMPLES {
        return None;
    }
    finite((ss / (count - 1) as f64).sqrt())
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
