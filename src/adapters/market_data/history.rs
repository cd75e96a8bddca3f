//! Historical Klines
//!
//! One-shot download of recent candles for backtests, plus the OHLCV CSV
//! writer the `fetch` command uses.

use std::path::Path;

use crate::adapters::pi42::{Kline, Pi42Client};
use crate::domain::PriceObservation;
use crate::ports::FeedError;

/// Download up to `limit` candles, oldest first
pub async fn fetch_history(
    client: &Pi42Client,
    pair: &str,
    interval: &str,
    limit: usize,
) -> Result<Vec<Kline>, FeedError> {
    let klines = client.fetch_klines(pair, interval, limit).await?;
    tracing::info!("Fetched {} {} candles for {}", klines.len(), interval, pair);
    Ok(klines)
}

pub fn to_observations(klines: &[Kline]) -> Result<Vec<PriceObservation>, FeedError> {
    klines.iter().map(Kline::to_observation).collect()
}

/// Write candles as `Timestamp,Open,High,Low,Close,Volume`, timestamps at
/// candle open in `%Y-%m-%d %H:%M:%S` UTC
pub fn write_klines_csv<P: AsRef<Path>>(path: P, klines: &[Kline]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Timestamp", "Open", "High", "Low", "Close", "Volume"])?;

    for kline in klines {
        let opened = kline
            .open_time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| kline.start_time.to_string());
        writer.write_record([
            opened,
            kline.open.to_string(),
            kline.high.to_string(),
            kline.low.to_string(),
            kline.close.to_string(),
            kline.volume.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
