//! Pi42 Kline Feed
//!
//! Live feed over the Pi42 klines endpoint. The first poll backfills enough
//! candles to fill the level window; every later poll asks for the latest
//! candle only. Backfilled candles are buffered and handed out one per
//! `next` call, and `pending` tells the loop to drain them without sleeping.
//! Only closed candles are handed out, each exactly once; a poll that finds
//! nothing new reports `FeedError::NotReady`.

use std::collections::VecDeque;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::adapters::pi42::{Kline, Pi42Client};
use crate::domain::PriceObservation;
use crate::ports::{FeedError, PriceFeed};

pub struct Pi42KlineFeed {
    client: Pi42Client,
    pair: String,
    interval: String,
    backfill: usize,
    buffer: VecDeque<PriceObservation>,
    last_timestamp: Option<DateTime<Utc>>,
    primed: bool,
}

impl Pi42KlineFeed {
    pub fn new(client: Pi42Client, pair: impl Into<String>, interval: impl Into<String>, backfill: usize) -> Self {
        Self {
            client,
            pair: pair.into(),
            interval: interval.into(),
            backfill: backfill.max(1),
            buffer: VecDeque::new(),
            last_timestamp: None,
            primed: false,
        }
    }

    /// Candles to request on the next poll
    fn request_size(&self) -> usize {
        if self.primed {
            1
        } else {
            self.backfill
        }
    }

    /// Queue closed candles newer than anything already handed out. The
    /// batch is converted up front so a malformed kline leaves the feed
    /// untouched.
    fn ingest(&mut self, klines: &[Kline], now: DateTime<Utc>) -> Result<usize, FeedError> {
        let observations = klines
            .iter()
            .map(Kline::to_observation)
            .collect::<Result<Vec<_>, _>>()?;

        let mut queued = 0;
        for observation in observations {
            if observation.timestamp > now {
                tracing::debug!("Skipping open candle closing {}", observation.timestamp);
                continue;
            }
            if let Some(last) = self.last_timestamp {
                if observation.timestamp <= last {
                    tracing::debug!("Dropping seen candle closing {}", observation.timestamp);
                    continue;
                }
            }
            self.last_timestamp = Some(observation.timestamp);
            self.buffer.push_back(observation);
            queued += 1;
        }
        self.primed = true;
        Ok(queued)
    }
}

#[async_trait]
impl PriceFeed for Pi42KlineFeed {
    async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError> {
        if let Some(observation) = self.buffer.pop_front() {
            return Ok(Some(observation));
        }

        let limit = self.request_size();
        let klines = self.client.fetch_klines(&self.pair, &self.interval, limit).await?;
        if klines.is_empty() {
            return Err(FeedError::Parse(format!("empty kline response for {}", self.pair)));
        }
        let queued = self.ingest(&klines, Utc::now())?;

        if limit > 1 {
            tracing::info!("Backfilled {} {} candles for {}", queued, self.interval, self.pair);
        }

        self.buffer
            .pop_front()
            .map(Some)
            .ok_or_else(|| FeedError::NotReady(format!("no closed {} candle for {} yet", self.interval, self.pair)))
    }

    fn pending(&self) -> usize {
        self.buffer.len()
    }
}
