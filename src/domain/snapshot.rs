use serde::{Deserialize, Serialize};

/// Rolling statistics at one observation.
///
/// `None` marks a value that is undefined for lack of data (or a zero
/// divisor). It is kept distinct from a genuine `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub zscore: Option<f64>,
    pub skewness: Option<f64>,
    /// Excess kurtosis (normal distribution = 0)
    pub kurtosis: Option<f64>,
}

impl StatisticsSnapshot {
    /// Both level statistics are defined
    pub fn has_band(&self) -> bool {
        self.mean.is_some() && self.std_dev.is_some()
    }

    /// Every field is defined
    pub fn is_complete(&self) -> bool {
        self.has_band()
            && self.zscore.is_some()
            && self.skewness.is_some()
            && self.kurtosis.is_some()
    }
}
