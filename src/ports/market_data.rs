use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::PriceObservation;

/// Price retrieval outcome other than an observation. Every variant is
/// transient: the loop waits one poll interval and asks again. `NotReady` is
/// not counted as a failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Data parsing error: {0}")]
    Parse(String),

    /// The source answered but has no new closed interval yet
    #[error("No new data: {0}")]
    NotReady(String),
}

/// Pull-based source of price observations.
///
/// `Ok(None)` is end of stream. Replay feeds reach it when their data runs
/// out; live feeds never do.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFeed: Send {
    async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError>;

    /// Observations already buffered that should be drained without waiting
    /// a poll interval
    fn pending(&self) -> usize {
        0
    }
}
