use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use super::execution::{ExecutionError, ExecutionPort, OrderAck, OrderRequest};
use super::market_data::{FeedError, PriceFeed};
use super::record_sink::{RecordSink, SinkError};
use crate::domain::{PriceObservation, TradeRecord};

/// Feed that replays a fixed script of results, errors included
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    script: VecDeque<Result<Option<PriceObservation>, FeedError>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, observation: PriceObservation) -> Self {
        self.script.push_back(Ok(Some(observation)));
        self
    }

    pub fn with_error(mut self, error: FeedError) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// Shared counter of `next` calls
    pub fn call_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError> {
        *self.calls.lock().unwrap() += 1;
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

/// Execution port that records calls and fails on demand
#[derive(Debug, Default, Clone)]
pub struct RecordingExecution {
    orders: Arc<Mutex<Vec<OrderRequest>>>,
    closes: Arc<Mutex<u32>>,
    fail_with: Option<String>,
}

impl RecordingExecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> u32 {
        *self.closes.lock().unwrap()
    }
}

#[async_trait]
impl ExecutionPort for RecordingExecution {
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        match &self.fail_with {
            Some(msg) => Err(ExecutionError::ApiError(msg.clone())),
            None => Ok(OrderAck {
                order_id: format!("mock-{}", orders.len()),
                status: Some("FILLED".to_string()),
            }),
        }
    }

    async fn close_all_positions(&self) -> Result<OrderAck, ExecutionError> {
        let mut closes = self.closes.lock().unwrap();
        *closes += 1;
        match &self.fail_with {
            Some(msg) => Err(ExecutionError::ApiError(msg.clone())),
            None => Ok(OrderAck {
                order_id: format!("close-{}", *closes),
                status: None,
            }),
        }
    }
}

/// Sink that rejects every append
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: u32,
}

impl FailingSink {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl RecordSink for FailingSink {
    fn append(&mut self, _record: &TradeRecord) -> Result<(), SinkError> {
        self.attempts += 1;
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{OrderSide, OrderType};

    #[tokio::test]
    async fn test_scripted_feed() {
        let mut feed = ScriptedFeed::new()
            .with_price(PriceObservation::now(10.0))
            .with_error(FeedError::Http("503".into()));
        let counter = feed.call_counter();

        assert!(matches!(feed.next().await, Ok(Some(_))));
        assert_eq!(feed.next().await, Err(FeedError::Http("503".into())));
        assert_eq!(feed.next().await, Ok(None));
        assert_eq!(*counter.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_recording_execution() {
        let exec = RecordingExecution::new();
        let order = OrderRequest {
            symbol: "ETHINR".into(),
            side: OrderSide::Buy,
            quantity: 0.01,
            margin_asset: "INR".into(),
            order_type: OrderType::Market,
        };

        let ack = exec.place_order(&order).await.unwrap();
        assert_eq!(ack.order_id, "mock-1");
        assert_eq!(exec.orders(), vec![order]);

        exec.close_all_positions().await.unwrap();
        assert_eq!(exec.close_calls(), 1);

        let broken = RecordingExecution::failing("down");
        assert!(broken.close_all_positions().await.is_err());
    }
}
