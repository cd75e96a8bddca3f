//! Replay Feed
//!
//! Finite feed over recorded closes, in memory or loaded from an OHLCV CSV
//! (`Timestamp,Open,High,Low,Close,Volume`). Reaches end of stream when the
//! data runs out.

use std::collections::VecDeque;
use std::path::Path;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::domain::PriceObservation;
use crate::ports::{FeedError, PriceFeed};

#[derive(Debug, Clone, Default)]
pub struct ReplayFeed {
    observations: VecDeque<PriceObservation>,
}

impl ReplayFeed {
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        Self {
            observations: observations.into(),
        }
    }

    /// Load every row of an OHLCV CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        Ok(Self::new(load_csv(path)?))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[async_trait]
impl PriceFeed for ReplayFeed {
    async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError> {
        Ok(self.observations.pop_front())
    }

    fn pending(&self) -> usize {
        self.observations.len()
    }
}

/// Read `(timestamp, close)` pairs from a CSV with a header row.
///
/// Columns are found by name, case-insensitively: `timestamp` or `date`, and
/// `close`. Rows are returned in file order.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceObservation>, FeedError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| FeedError::Parse(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| FeedError::Parse(format!("{}: {}", path.display(), e)))?
        .clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
            .ok_or_else(|| FeedError::Parse(format!("{}: missing {} column", path.display(), names[0])))
    };
    let time_col = column(&["timestamp", "date", "datetime"])?;
    let close_col = column(&["close"])?;

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| FeedError::Parse(format!("row {}: {}", row + 1, e)))?;

        let raw_time = record.get(time_col).unwrap_or_default();
        let timestamp = parse_timestamp(raw_time)
            .ok_or_else(|| FeedError::Parse(format!("row {}: bad timestamp {:?}", row + 1, raw_time)))?;

        let raw_close = record.get(close_col).unwrap_or_default();
        let price: f64 = raw_close
            .trim()
            .parse()
            .map_err(|_| FeedError::Parse(format!("row {}: bad close {:?}", row + 1, raw_close)))?;

        observations.push(PriceObservation::new(timestamp, price));
    }

    tracing::info!("Loaded {} observations from {}", observations.len(), path.display());
    Ok(observations)
}

/// RFC 3339, `%Y-%m-%d %H:%M:%S` (UTC) or epoch milliseconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}
