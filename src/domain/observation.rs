use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single closing price pulled from a feed.
///
/// Observations are immutable once created and are consumed in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceObservation {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }

    /// Observation stamped with the current wall-clock time
    pub fn now(price: f64) -> Self {
        Self::new(Utc::now(), price)
    }

    /// True when the price can enter the statistics window
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
